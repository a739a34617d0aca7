//! Upload handlers and the per-user upload ledger

use axum::{
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use greenleaf_core::{GreenLeafError, ProviderStatus, Role, UploadAttempt, UploadResult, UploadStats};
use greenleaf_upload::{UploadFile, UploadLedger};
use serde_json::json;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// Multipart field holding the image
const FILE_FIELD: &str = "file";

async fn read_file(state: &AppState, mut multipart: Multipart) -> ApiResult<UploadFile> {
    let rejected = |err: MultipartError| {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::validation(format!(
                "File exceeds the {} MB limit",
                state.config.max_upload_mb
            ))
        } else {
            debug!(error = %err.body_text(), "Malformed multipart body");
            ApiError::validation("Malformed upload request")
        }
    };

    while let Some(field) = multipart.next_field().await.map_err(rejected)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field.bytes().await.map_err(rejected)?;
        return Ok(UploadFile::new(name, content_type, bytes.to_vec()));
    }

    Err(ApiError::validation("Missing file field"))
}

/// `POST /uploads`
///
/// The attempt enters the caller's ledger as pending and is settled with
/// whatever the chain returns, rejected files included.
pub async fn upload(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> ApiResult<Response> {
    let file = read_file(&state, multipart).await?;

    let entry_id = state
        .ledgers
        .write()
        .await
        .entry(user.id.clone())
        .or_default()
        .add_pending(&file.name, file.size());

    let outcome = state.uploader.upload(&file).await;

    let result = match &outcome {
        Ok(result) => result.clone(),
        Err(rejected) => UploadResult::failed(None, rejected.to_string()),
    };
    if let Some(ledger) = state.ledgers.write().await.get_mut(&user.id) {
        ledger.resolve(&entry_id, &result);
    }
    debug!(user_id = %user.id, entry = %entry_id, success = result.success, "Upload recorded");

    let result = outcome?;
    if result.success {
        Ok(Json(result).into_response())
    } else {
        let message = result
            .error
            .unwrap_or_else(|| "All upload providers failed".to_string());
        Err(ApiError(GreenLeafError::UpstreamProviderFailure(message)))
    }
}

/// `GET /uploads/providers`
pub async fn providers(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<Vec<ProviderStatus>>> {
    current.require_role(&state, &[Role::Admin, Role::Researcher])?;
    Ok(Json(state.uploader.provider_status().await))
}

/// `GET /uploads/history`
pub async fn history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<Vec<UploadAttempt>> {
    let ledgers = state.ledgers.read().await;
    let entries = ledgers
        .get(&user.id)
        .map(|ledger| ledger.entries().cloned().collect())
        .unwrap_or_default();
    Json(entries)
}

/// `GET /uploads/stats`
pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<UploadStats> {
    let ledgers = state.ledgers.read().await;
    Json(
        ledgers
            .get(&user.id)
            .map(UploadLedger::stats)
            .unwrap_or_default(),
    )
}

/// `DELETE /uploads/history/:id`
pub async fn remove_entry(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let removed = state
        .ledgers
        .write()
        .await
        .get_mut(&user.id)
        .map(|ledger| ledger.remove_upload(&id))
        .unwrap_or(false);

    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("Upload"))
    }
}

/// `DELETE /uploads/history`
pub async fn clear_history(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Json<serde_json::Value> {
    if let Some(ledger) = state.ledgers.write().await.get_mut(&user.id) {
        ledger.clear_uploads();
    }
    Json(json!({ "success": true }))
}
