/*
 * Responsibility
 * - GET/POST /auth/verify: credential → principal + capabilities
 * - OPTIONS /auth/verify: preflight (200 {"success": true})
 * - 失敗は必ず 401 (AuthError::into_response)。5xx は返さない
 */
use axum::{Json, extract::State, http::HeaderMap};

use crate::api::v1::dto::auth::{PreflightResponse, VerifyResponse};
use crate::services::auth::AuthError;
use crate::state::AppState;

pub async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VerifyResponse>, AuthError> {
    let verified = state.auth.clone().verify_guarded(headers).await?;
    Ok(Json(VerifyResponse::from(verified)))
}

pub async fn preflight() -> Json<PreflightResponse> {
    Json(PreflightResponse::ok())
}
