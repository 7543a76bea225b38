/*
 * Responsibility
 * - /auth/verify の response DTO
 * - 失敗時の envelope は crate::error::ErrorResponse (AuthError::into_response)
 */
use serde::Serialize;

use crate::services::auth::VerifiedPrincipal;

#[derive(Debug, Serialize)]
pub struct PreflightResponse {
    pub success: bool,
}

impl PreflightResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub user: UserPayload,
}

#[derive(Debug, Serialize)]
pub struct UserPayload {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

impl From<VerifiedPrincipal> for VerifyResponse {
    fn from(v: VerifiedPrincipal) -> Self {
        let VerifiedPrincipal {
            principal,
            capabilities,
        } = v;

        Self {
            success: true,
            user: UserPayload {
                id: principal.id,
                username: principal.username,
                email: principal.email,
                first_name: principal.first_name,
                last_name: principal.last_name,
                roles: capabilities.roles,
                permissions: capabilities.permissions,
            },
        }
    }
}
