//! HTTP error responses

use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use greenleaf_auth::AuthError;
use greenleaf_core::GreenLeafError;
use greenleaf_upload::UploadError;
use serde_json::json;

/// Renders as `{"success": false, "error": "<message>"}` with the status of
/// its kind. Internal detail is logged, never sent.
#[derive(Debug)]
pub struct ApiError(pub GreenLeafError);

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError(GreenLeafError::validation(message))
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        ApiError(GreenLeafError::NotFound(what.into()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if let GreenLeafError::Internal(detail) = &self.0 {
            tracing::error!(error = %detail, "Request failed");
        }

        (
            status,
            Json(json!({
                "success": false,
                "error": self.0.public_message(),
            })),
        )
            .into_response()
    }
}

impl From<GreenLeafError> for ApiError {
    fn from(err: GreenLeafError) -> Self {
        ApiError(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError(err.kind())
    }
}

impl From<UploadError> for ApiError {
    fn from(err: UploadError) -> Self {
        ApiError(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "Rejected request body");
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => "Expected a JSON request body",
            _ => "Invalid request body",
        };
        ApiError::validation(message)
    }
}

/// `axum::Json` extractor whose rejections render as validation errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

pub type ApiResult<T> = Result<T, ApiError>;
