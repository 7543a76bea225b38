/*
 * Responsibility
 * - GET/POST /rbac/grant-basic-permissions (dev / admin tool)
 * - 失敗時はオペレーター向けにエラーメッセージをそのまま 500 で返す
 * - その他のメソッドは 405 (/auth/verify の fallback でも共用)
 */
use axum::{Json, extract::State};

use crate::api::v1::dto::rbac::GrantPermissionsResponse;
use crate::error::AppError;
use crate::state::AppState;

pub async fn grant_basic_permissions(
    State(state): State<AppState>,
) -> Result<Json<GrantPermissionsResponse>, AppError> {
    let report = state
        .provisioner
        .grant_basic_permissions()
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "grant_basic_permissions failed");
            AppError::from(e)
        })?;

    Ok(Json(report.into()))
}

pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}
