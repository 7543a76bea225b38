//! Store interface used by the permission provisioner.
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::repos::error::RepoResult;
use crate::repos::rbac_repo::{PermissionRow, RoleRow};
use crate::services::rbac::schema::AssociationSchema;

/// Role/permission catalog plus the role-permission association table.
///
/// `now` is only written when the schema has `created_at`; the caller decides
/// what now is. `insert_association` must surface a unique-key violation on
/// `(role_id, permission_id)` as `RepoError::Conflict`.
#[async_trait]
pub trait RbacStore: Send + Sync {
    async fn roles_named(&self, names: &[&str]) -> RepoResult<Vec<RoleRow>>;

    async fn permissions_named(&self, names: &[&str]) -> RepoResult<Vec<PermissionRow>>;

    /// Column names of the association table, as reported by the store.
    async fn association_columns(&self) -> RepoResult<Vec<String>>;

    async fn association_exists(&self, role_id: i64, permission_id: i64) -> RepoResult<bool>;

    /// Sets `active = TRUE` on an existing, deactivated association. Only
    /// called when the schema has the `active` column. Returns whether a row
    /// changed.
    async fn reactivate_association(&self, role_id: i64, permission_id: i64) -> RepoResult<bool>;

    async fn insert_association(
        &self,
        schema: AssociationSchema,
        role_id: i64,
        permission_id: i64,
        now: DateTime<Utc>,
    ) -> RepoResult<()>;
}
