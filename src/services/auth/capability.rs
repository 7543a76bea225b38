use serde::Serialize;

use crate::services::auth::{
    directory::{Directory, Principal},
    error::AuthError,
};

/// Roles and permissions attached to a principal at verification time.
///
/// Derived per call; never cached across requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CapabilitySet {
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CapabilityResolver {
    directory: Directory,
}

impl CapabilityResolver {
    pub fn new(directory: Directory) -> Self {
        Self { directory }
    }

    /// Strict hydration: reports why capabilities could not be obtained.
    pub async fn resolve(&self, principal: &Principal) -> Result<CapabilitySet, AuthError> {
        let directory = self
            .directory
            .capabilities()
            .ok_or(AuthError::CapabilityHydrationUnsupported)?;

        let roles = directory
            .roles_for(principal.id)
            .await
            .map_err(|e| AuthError::UnexpectedFault(e.to_string()))?;
        let permissions = directory
            .permissions_for(principal.id)
            .await
            .map_err(|e| AuthError::UnexpectedFault(e.to_string()))?;

        Ok(CapabilitySet { roles, permissions })
    }

    /// Best-effort hydration used by the verify flow; never fails.
    pub async fn resolve_or_empty(&self, principal: &Principal) -> CapabilitySet {
        match self.resolve(principal).await {
            Ok(set) => set,
            Err(AuthError::CapabilityHydrationUnsupported) => {
                tracing::debug!(
                    principal_id = principal.id,
                    "directory has no capability queries; returning empty capability set"
                );
                CapabilitySet::default()
            }
            Err(err) => {
                tracing::warn!(
                    principal_id = principal.id,
                    error = %err,
                    "capability hydration failed; returning empty capability set"
                );
                CapabilitySet::default()
            }
        }
    }
}
