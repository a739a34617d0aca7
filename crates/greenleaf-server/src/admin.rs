//! Admin-only maintenance routes

use axum::{extract::State, response::Json};
use greenleaf_core::Role;
use serde_json::json;

use crate::error::ApiResult;
use crate::middleware::CurrentUser;
use crate::state::AppState;

/// `POST /admin/reset-tokens/purge`
pub async fn purge_reset_tokens(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<serde_json::Value>> {
    current.require_role(&state, &[Role::Admin])?;

    let removed = state.resets.purge_expired().await?;
    Ok(Json(json!({ "success": true, "removed": removed })))
}
