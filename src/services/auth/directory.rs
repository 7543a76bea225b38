//! Principal directory seam.
//!
//! The verify flow only needs `find(id)`. Role/permission queries are an
//! optional capability of a directory; whether a directory has it is decided
//! once, when [`Directory`] is constructed, never probed per request.
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::repos::error::RepoResult;

pub const STATUS_ACTIVE: &str = "active";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub status: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Principal {
    pub fn is_active(&self) -> bool {
        self.status == STATUS_ACTIVE
    }
}

#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    async fn find(&self, id: i64) -> RepoResult<Option<Principal>>;
}

/// A directory that can also answer role/permission queries.
#[async_trait]
pub trait CapabilityDirectory: PrincipalDirectory {
    async fn roles_for(&self, principal_id: i64) -> RepoResult<Vec<String>>;

    async fn permissions_for(&self, principal_id: i64) -> RepoResult<Vec<String>>;
}

#[derive(Clone)]
pub enum Directory {
    WithCapabilities(Arc<dyn CapabilityDirectory>),
    Basic(Arc<dyn PrincipalDirectory>),
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Directory::WithCapabilities(_) => f.write_str("Directory::WithCapabilities"),
            Directory::Basic(_) => f.write_str("Directory::Basic"),
        }
    }
}

impl Directory {
    pub fn with_capabilities(directory: Arc<dyn CapabilityDirectory>) -> Self {
        Directory::WithCapabilities(directory)
    }

    pub fn basic(directory: Arc<dyn PrincipalDirectory>) -> Self {
        Directory::Basic(directory)
    }

    pub async fn find(&self, id: i64) -> RepoResult<Option<Principal>> {
        match self {
            Directory::WithCapabilities(d) => d.find(id).await,
            Directory::Basic(d) => d.find(id).await,
        }
    }

    pub fn capabilities(&self) -> Option<&dyn CapabilityDirectory> {
        match self {
            Directory::WithCapabilities(d) => Some(d.as_ref()),
            Directory::Basic(_) => None,
        }
    }
}
