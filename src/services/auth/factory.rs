/// Factory: build `AuthBoundary` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::repos::user_repo::PgPrincipalDirectory;
use crate::services::auth::{AuthBoundary, Directory};

/// The directory variant is fixed here, once, from configuration.
pub fn build_auth_boundary(
    config: &Config,
    directory: Arc<PgPrincipalDirectory>,
) -> anyhow::Result<Arc<AuthBoundary>> {
    let directory = if config.auth.capability_queries {
        Directory::with_capabilities(directory)
    } else {
        Directory::basic(directory)
    };

    tracing::info!(?directory, "auth boundary directory");

    let boundary = AuthBoundary::new(&config.auth, directory).map_err(anyhow::Error::msg)?;

    Ok(Arc::new(boundary))
}
