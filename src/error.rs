/*
 * Responsibility
 * - アプリ共通の AppError 定義 (admin / dev-tool endpoints)
 * - IntoResponse 実装 (HTTP status / JSON envelope `{"success": false, "message": ...}`)
 * - 認証失敗 (401) は services::auth::AuthError 側で同じ envelope を使う
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::rbac::ProvisionError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = Some(code);
        self
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("method not allowed")]
    MethodNotAllowed,
    /// Operator-facing failure; the message is returned verbatim.
    #[error("{0}")]
    Operation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Operation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

impl From<ProvisionError> for AppError {
    fn from(e: ProvisionError) -> Self {
        AppError::Operation(e.to_string())
    }
}
