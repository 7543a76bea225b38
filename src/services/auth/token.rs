use jsonwebtoken::{Algorithm, DecodingKey, Validation, errors::ErrorKind};
use serde::Deserialize;
use thiserror::Error;

use crate::config::AuthConfig;

/// Why a token was rejected.
///
/// Only logged; callers collapse every variant into one outward message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token")]
    MalformedToken,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => TokenError::Expired,
            // A token minted for another issuer/audience or with another
            // algorithm is treated like a bad signature.
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience => TokenError::InvalidSignature,
            _ => TokenError::MalformedToken,
        }
    }
}

/// Raw JWT claims as sent by the issuer.
///
/// The subject may arrive as `sub` (string or number) or, from older issuers,
/// as a numeric `user_id` claim.
#[derive(Debug, Clone, Deserialize)]
struct RawClaims {
    #[serde(default)]
    sub: Option<serde_json::Value>,
    #[serde(default)]
    user_id: Option<serde_json::Value>,
    exp: u64,
}

fn subject_id(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Verified claims in the shape the boundary uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenClaims {
    pub subject: i64,
    pub expires_at: u64,
}

/// HS256 verifier bound to a shared secret.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = config.leeway_seconds;
        validation.set_required_spec_claims(&["exp"]);

        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
        }
        match &config.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }

        Self {
            decoding_key,
            validation,
        }
    }

    /// Check signature and expiry together and extract the subject.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = jsonwebtoken::decode::<RawClaims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        let subject = claims
            .sub
            .as_ref()
            .and_then(subject_id)
            .or_else(|| claims.user_id.as_ref().and_then(subject_id))
            .ok_or(TokenError::MalformedToken)?;

        Ok(TokenClaims {
            subject,
            expires_at: claims.exp,
        })
    }
}
