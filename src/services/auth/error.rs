//! Verify-boundary errors.
//!
//! Every variant renders as `401` with the same envelope. The internal
//! variant is only visible in logs; the outward message never says which
//! check failed. Unexpected faults carry `code = "verify_unavailable"` so a
//! caller can tell "rejected" from "degraded".

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::error::ErrorResponse;
use crate::services::auth::token::TokenError;

pub const VERIFY_UNAVAILABLE: &str = "verify_unavailable";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no credential presented")]
    MissingCredential,
    #[error("malformed credential")]
    MalformedCredential,
    #[error("invalid or expired signature")]
    InvalidOrExpiredSignature,
    #[error("unknown or inactive principal")]
    UnknownOrInactivePrincipal,
    /// Non-fatal: the directory cannot answer role/permission queries.
    #[error("capability hydration unsupported by directory")]
    CapabilityHydrationUnsupported,
    #[error("unexpected fault: {0}")]
    UnexpectedFault(String),
}

impl AuthError {
    /// Client-safe message.
    pub fn public_message(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "No token provided",
            AuthError::MalformedCredential | AuthError::InvalidOrExpiredSignature => {
                "Invalid or expired token"
            }
            AuthError::UnknownOrInactivePrincipal => "Invalid user",
            AuthError::CapabilityHydrationUnsupported | AuthError::UnexpectedFault(_) => {
                "Token verification temporarily unavailable"
            }
        }
    }

    pub fn public_code(&self) -> Option<&'static str> {
        match self {
            AuthError::CapabilityHydrationUnsupported | AuthError::UnexpectedFault(_) => {
                Some(VERIFY_UNAVAILABLE)
            }
            _ => None,
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::MalformedToken => AuthError::MalformedCredential,
            TokenError::InvalidSignature | TokenError::Expired => {
                AuthError::InvalidOrExpiredSignature
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let mut body = ErrorResponse::new(self.public_message());
        if let Some(code) = self.public_code() {
            body = body.with_code(code);
        }

        (StatusCode::UNAUTHORIZED, Json(body)).into_response()
    }
}
