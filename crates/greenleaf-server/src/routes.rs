//! Account, session and password-reset handlers

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use greenleaf_auth::{AuthStrategyKind, LoginOutcome, Registration};
use greenleaf_core::{GeoLocation, ProfileUpdate, Role};
use serde::Deserialize;
use serde_json::json;

use crate::error::{ApiError, ApiResult, JsonBody};
use crate::middleware::{clear_session_cookie, session_cookie, CurrentUser};
use crate::state::AppState;

/// Health check
pub async fn health() -> &'static str {
    "OK"
}

fn require_local(state: &AppState) -> ApiResult<()> {
    match state.gate.strategy_kind() {
        AuthStrategyKind::Local => Ok(()),
        AuthStrategyKind::Federated => Err(ApiError::validation(
            "Password sign-in is handled by the identity provider",
        )),
    }
}

/// Body plus the cookie that carries the session
fn signed_in(state: &AppState, status: StatusCode, outcome: LoginOutcome) -> impl IntoResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        session_cookie(
            &outcome.token,
            state.accounts.session_ttl_seconds(),
            state.config.secure_cookies,
        ),
    );

    (
        status,
        headers,
        Json(json!({
            "success": true,
            "user": outcome.user,
            "token": outcome.token,
        })),
    )
}

// ── Sessions ────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
    pub location: Option<GeoLocation>,
}

/// `POST /auth/register`
pub async fn register(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RegisterRequest>,
) -> ApiResult<impl IntoResponse> {
    require_local(&state)?;

    let role = body.role.unwrap_or_else(Role::lowest);
    if role == Role::Admin {
        return Err(ApiError::validation("Admin accounts cannot be self-registered"));
    }

    let outcome = state
        .accounts
        .register(Registration {
            name: body.name,
            email: body.email,
            password: body.password,
            role,
            location: body.location,
        })
        .await?;

    Ok(signed_in(&state, StatusCode::CREATED, outcome))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// `POST /auth/login`
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    require_local(&state)?;

    let outcome = state.accounts.login(&body.email, &body.password).await?;
    Ok(signed_in(&state, StatusCode::OK, outcome))
}

/// `POST /auth/logout`
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, clear_session_cookie(state.config.secure_cookies))],
        Json(json!({ "success": true })),
    )
}

// ── Profile ─────────────────────────────────────────────────────

/// `GET /auth/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<serde_json::Value> {
    Json(json!({ "success": true, "user": user }))
}

/// `PATCH /auth/me`
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> ApiResult<Json<serde_json::Value>> {
    let updated = state.accounts.update_profile(&user.id, update).await?;
    Ok(Json(json!({ "success": true, "user": updated })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

/// `POST /auth/change-password`
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    JsonBody(body): JsonBody<ChangePasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .accounts
        .change_password(&user.id, &body.current_password, &body.new_password)
        .await?;
    Ok(Json(json!({ "success": true })))
}

// ── Password reset ──────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// `POST /auth/forgot-password`
///
/// Answers the same way whether or not the account exists.
pub async fn forgot_password(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ForgotPasswordRequest>,
) -> Json<serde_json::Value> {
    state.resets.request_reset(&body.email).await;
    Json(json!({
        "success": true,
        "message": "If an account exists for that email, a password reset link has been sent.",
    }))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// `POST /auth/reset-password`
pub async fn reset_password(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<ResetPasswordRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    state.resets.consume_reset(&body.token, &body.password).await?;
    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct VerifyResetTokenRequest {
    pub token: String,
}

/// `POST /auth/verify-reset-token`
pub async fn verify_reset_token(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<VerifyResetTokenRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let valid = match state.resets.verify_token(&body.token).await {
        Ok(()) => true,
        Err(greenleaf_auth::AuthError::InvalidOrExpired) => false,
        Err(other) => return Err(other.into()),
    };
    Ok(Json(json!({ "success": true, "valid": valid })))
}
