/*
 * Responsibility
 * - v1 の URL 構造を定義
 * - /health, /auth/verify, /rbac/grant-basic-permissions
 * - CORS は app.rs で v1 全体に掛ける
 */
use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

use crate::api::v1::handlers::{
    auth::{preflight, verify},
    health::health,
    rbac::{grant_basic_permissions, method_not_allowed},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route(
            "/auth/verify",
            get(verify)
                .post(verify)
                .options(preflight)
                .fallback(method_not_allowed),
        )
        .route(
            "/rbac/grant-basic-permissions",
            post(grant_basic_permissions)
                .get(grant_basic_permissions)
                .options(preflight)
                .fallback(method_not_allowed),
        )
}
