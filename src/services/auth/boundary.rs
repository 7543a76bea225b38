//! Verify flow.
//!
//! ```text
//! extract credential --absent--> MissingCredential
//!   -> verify token --fail--> MalformedCredential | InvalidOrExpiredSignature
//!   -> find principal --missing/inactive--> UnknownOrInactivePrincipal
//!   -> hydrate capabilities (best-effort)
//!   -> VerifiedPrincipal
//! ```
//!
//! [`AuthBoundary::verify_guarded`] is the entry point for handlers: it runs
//! the flow in its own task under a deadline so that a panic, a hung store or
//! any other fault outside the branches above still ends as an [`AuthError`]
//! (and therefore a 401), never a 5xx.
use std::{sync::Arc, time::Duration};

use axum::http::HeaderMap;

use crate::config::AuthConfig;
use crate::services::auth::{
    capability::{CapabilityResolver, CapabilitySet},
    credential::CredentialExtractor,
    directory::{Directory, Principal},
    error::AuthError,
    token::TokenVerifier,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPrincipal {
    pub principal: Principal,
    pub capabilities: CapabilitySet,
}

#[derive(Debug)]
pub struct AuthBoundary {
    extractor: CredentialExtractor,
    verifier: TokenVerifier,
    directory: Directory,
    resolver: CapabilityResolver,
    verify_timeout: Duration,
}

impl AuthBoundary {
    pub fn new(config: &AuthConfig, directory: Directory) -> Result<Self, String> {
        Ok(Self {
            extractor: CredentialExtractor::from_config(config)?,
            verifier: TokenVerifier::new(config),
            resolver: CapabilityResolver::new(directory.clone()),
            directory,
            verify_timeout: config.verify_timeout,
        })
    }

    pub fn directory_kind(&self) -> &'static str {
        match self.directory {
            Directory::WithCapabilities(_) => "with_capabilities",
            Directory::Basic(_) => "basic",
        }
    }

    pub async fn verify(&self, headers: &HeaderMap) -> Result<VerifiedPrincipal, AuthError> {
        let credential = self.extractor.extract(headers).ok_or_else(|| {
            tracing::debug!("no credential presented");
            AuthError::MissingCredential
        })?;

        let claims = self.verifier.verify(&credential.token).map_err(|err| {
            tracing::warn!(
                source = ?credential.source,
                error = %err,
                "token verification failed"
            );
            AuthError::from(err)
        })?;
        tracing::debug!(
            source = ?credential.source,
            principal_id = claims.subject,
            expires_at = claims.expires_at,
            "token verified"
        );

        let principal = self
            .directory
            .find(claims.subject)
            .await
            .map_err(|err| {
                tracing::error!(
                    principal_id = claims.subject,
                    error = %err,
                    "principal lookup failed"
                );
                AuthError::UnexpectedFault(err.to_string())
            })?
            .ok_or_else(|| {
                tracing::warn!(principal_id = claims.subject, "principal not found");
                AuthError::UnknownOrInactivePrincipal
            })?;

        if !principal.is_active() {
            tracing::warn!(
                principal_id = principal.id,
                status = %principal.status,
                "principal is not active"
            );
            return Err(AuthError::UnknownOrInactivePrincipal);
        }

        let capabilities = self.resolver.resolve_or_empty(&principal).await;

        Ok(VerifiedPrincipal {
            principal,
            capabilities,
        })
    }

    /// Top-level guard around [`Self::verify`].
    pub async fn verify_guarded(
        self: Arc<Self>,
        headers: HeaderMap,
    ) -> Result<VerifiedPrincipal, AuthError> {
        let deadline = self.verify_timeout;
        let mut task = tokio::spawn(async move { self.verify(&headers).await });

        match tokio::time::timeout(deadline, &mut task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => {
                tracing::error!(error = %join_err, "verify task aborted");
                Err(AuthError::UnexpectedFault(join_err.to_string()))
            }
            Err(_) => {
                task.abort();
                tracing::error!(timeout_ms = deadline.as_millis() as u64, "verify timed out");
                Err(AuthError::UnexpectedFault("verification timed out".into()))
            }
        }
    }
}
