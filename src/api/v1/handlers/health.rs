/*
 * Responsibility
 * - GET /health (疎通用, 認証不要)
 * - directory が capability query を持つかどうかも返す (運用時の確認用)
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "ok",
            "directory": state.auth.directory_kind(),
        })),
    )
}
