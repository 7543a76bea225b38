//! Bearer credential extraction.
//!
//! Precedence is fixed and decides which credential wins when a caller sends
//! more than one:
//! 1. `Authorization: Bearer <token>` (scheme is case-insensitive)
//! 2. custom header carrying the raw token (default `X-Auth-Token`)
//! 3. cookie carrying the raw token (default `auth_token`)

use axum::http::{HeaderMap, HeaderName, header};

use crate::config::AuthConfig;

/// Where the winning credential came from (log correlation only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Authorization,
    Header,
    Cookie,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub source: CredentialSource,
}

#[derive(Debug, Clone)]
pub struct CredentialExtractor {
    header: HeaderName,
    cookie: String,
}

impl CredentialExtractor {
    pub fn new(header: HeaderName, cookie: impl Into<String>) -> Self {
        Self {
            header,
            cookie: cookie.into(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, String> {
        let header = HeaderName::from_bytes(config.token_header.as_bytes())
            .map_err(|e| format!("invalid token header name {:?}: {}", config.token_header, e))?;
        Ok(Self::new(header, config.token_cookie.clone()))
    }

    pub fn extract(&self, headers: &HeaderMap) -> Option<Credential> {
        if let Some(token) = bearer_token(headers) {
            return Some(Credential {
                token,
                source: CredentialSource::Authorization,
            });
        }

        if let Some(token) = headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
        {
            return Some(Credential {
                token: token.to_string(),
                source: CredentialSource::Header,
            });
        }

        cookie_value(headers, &self.cookie).map(|token| Credential {
            token,
            source: CredentialSource::Cookie,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::AUTHORIZATION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            if !scheme.eq_ignore_ascii_case("bearer") {
                return None;
            }
            let token = token.trim();
            (!token.is_empty()).then(|| token.to_string())
        })
}

// Several Cookie headers may be present (HTTP/2 splits them); first match wins.
fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| k.trim() == name)
        .map(|(_, v)| v.trim().trim_matches('"').to_string())
        .filter(|v| !v.is_empty())
}
