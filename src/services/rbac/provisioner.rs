//! Grants the basic permission set to the administrative role.
//!
//! Idempotent: running it twice inserts nothing the second time. The
//! existence probe is only an optimisation; concurrent runs are kept correct
//! by the store's unique constraint on `(role_id, permission_id)`, and a
//! duplicate-key fault on insert counts as "already present".
//!
//! When the association table has an `active` column, an existing but
//! deactivated grant is switched back on instead of being left as is.
use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::rbac::{schema::SchemaIntrospector, store::RbacStore};

pub const ADMIN_ROLE: &str = "admin";
pub const SUPER_ADMIN_ROLE: &str = "super_admin";

pub const BASIC_PERMISSIONS: &[&str] = &["roles.view", "desks.view"];

#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("no 'admin' or 'super_admin' role found")]
    RoleNotFound,
    #[error("permission catalog is missing required permissions: {}", .missing.join(", "))]
    PermissionCatalogIncomplete { missing: Vec<String> },
    #[error("store error: {0}")]
    Store(#[from] RepoError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProvisionReport {
    pub role: String,
    pub role_id: i64,
    pub permission_ids: BTreeMap<String, i64>,
    /// Permissions whose association was created by this run.
    pub inserted: Vec<String>,
    /// Permissions whose existing, deactivated association was re-enabled.
    pub reactivated: Vec<String>,
}

#[derive(Clone)]
pub struct PermissionProvisioner {
    store: Arc<dyn RbacStore>,
    required: Vec<String>,
}

impl std::fmt::Debug for PermissionProvisioner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermissionProvisioner")
            .field("required", &self.required)
            .finish()
    }
}

impl PermissionProvisioner {
    pub fn new(store: Arc<dyn RbacStore>) -> Self {
        Self::with_permissions(store, BASIC_PERMISSIONS.iter().copied())
    }

    pub fn with_permissions<I, S>(store: Arc<dyn RbacStore>, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            store,
            required: required.into_iter().map(Into::into).collect(),
        }
    }

    pub async fn grant_basic_permissions(&self) -> Result<ProvisionReport, ProvisionError> {
        let (role, role_id) = self.resolve_role().await?;
        let permission_ids = self.resolve_permissions().await?;

        let schema = SchemaIntrospector::new(self.store.as_ref()).inspect().await?;
        let now = Utc::now();

        let mut inserted = Vec::new();
        let mut reactivated = Vec::new();
        for name in &self.required {
            let Some(&permission_id) = permission_ids.get(name) else {
                continue;
            };

            if self
                .store
                .association_exists(role_id, permission_id)
                .await?
            {
                if schema.has_active()
                    && self
                        .store
                        .reactivate_association(role_id, permission_id)
                        .await?
                {
                    tracing::info!(role_id, permission = %name, "association reactivated");
                    reactivated.push(name.clone());
                }
                continue;
            }

            match self
                .store
                .insert_association(schema, role_id, permission_id, now)
                .await
            {
                Ok(()) => inserted.push(name.clone()),
                Err(RepoError::Conflict) => {
                    tracing::info!(
                        role_id,
                        permission = %name,
                        "association inserted concurrently; treating as present"
                    );
                }
                Err(err) => {
                    tracing::error!(
                        role_id,
                        permission = %name,
                        inserted = ?inserted,
                        error = %err,
                        "association insert failed"
                    );
                    return Err(err.into());
                }
            }
        }

        tracing::info!(
            role = %role,
            role_id,
            ?schema,
            inserted = ?inserted,
            reactivated = ?reactivated,
            "basic permissions provisioned"
        );

        Ok(ProvisionReport {
            role,
            role_id,
            permission_ids,
            inserted,
            reactivated,
        })
    }

    // `admin` wins over `super_admin` regardless of the order rows come back in.
    async fn resolve_role(&self) -> Result<(String, i64), ProvisionError> {
        let rows = self
            .store
            .roles_named(&[ADMIN_ROLE, SUPER_ADMIN_ROLE])
            .await?;

        [ADMIN_ROLE, SUPER_ADMIN_ROLE]
            .iter()
            .find_map(|wanted| rows.iter().find(|r| r.name == *wanted))
            .map(|r| (r.name.clone(), r.id))
            .ok_or(ProvisionError::RoleNotFound)
    }

    async fn resolve_permissions(&self) -> Result<BTreeMap<String, i64>, ProvisionError> {
        let names: Vec<&str> = self.required.iter().map(String::as_str).collect();
        let rows = self.store.permissions_named(&names).await?;

        let found: BTreeMap<String, i64> = rows
            .into_iter()
            .filter(|r| self.required.contains(&r.name))
            .map(|r| (r.name, r.id))
            .collect();

        let missing: Vec<String> = self
            .required
            .iter()
            .filter(|name| !found.contains_key(*name))
            .cloned()
            .collect();

        if !missing.is_empty() {
            return Err(ProvisionError::PermissionCatalogIncomplete { missing });
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::memory::InMemoryRbacStore;
    use crate::services::rbac::AssociationSchema;

    fn catalog(schema: AssociationSchema) -> Arc<InMemoryRbacStore> {
        let store = InMemoryRbacStore::new(schema);
        store.add_role(1, "admin");
        store.add_permission(10, "roles.view");
        store.add_permission(11, "desks.view");
        store.add_permission(12, "leads.view");
        Arc::new(store)
    }

    #[tokio::test]
    async fn second_run_inserts_nothing() {
        let store = catalog(AssociationSchema::WithActiveAndCreatedAt);
        let provisioner = PermissionProvisioner::new(store.clone());

        let first = provisioner.grant_basic_permissions().await.unwrap();
        assert_eq!(first.role, "admin");
        assert_eq!(first.role_id, 1);
        assert_eq!(first.inserted, vec!["roles.view", "desks.view"]);
        assert_eq!(first.permission_ids.get("desks.view"), Some(&11));

        let second = provisioner.grant_basic_permissions().await.unwrap();
        assert!(second.inserted.is_empty());
        assert_eq!(second.permission_ids, first.permission_ids);

        assert_eq!(store.associations().len(), 2);
    }

    #[tokio::test]
    async fn admin_wins_over_super_admin_in_any_order() {
        for admin_first in [true, false] {
            let store = InMemoryRbacStore::new(AssociationSchema::Bare);
            if admin_first {
                store.add_role(1, "admin");
                store.add_role(2, "super_admin");
            } else {
                store.add_role(2, "super_admin");
                store.add_role(1, "admin");
            }
            store.add_permission(10, "roles.view");
            store.add_permission(11, "desks.view");

            let report = PermissionProvisioner::new(Arc::new(store))
                .grant_basic_permissions()
                .await
                .unwrap();
            assert_eq!(report.role, "admin");
            assert_eq!(report.role_id, 1);
        }
    }

    #[tokio::test]
    async fn falls_back_to_super_admin() {
        let store = InMemoryRbacStore::new(AssociationSchema::Bare);
        store.add_role(7, "super_admin");
        store.add_permission(10, "roles.view");
        store.add_permission(11, "desks.view");

        let report = PermissionProvisioner::new(Arc::new(store))
            .grant_basic_permissions()
            .await
            .unwrap();
        assert_eq!(report.role, "super_admin");
        assert_eq!(report.role_id, 7);
    }

    #[tokio::test]
    async fn missing_role_is_an_error() {
        let store = InMemoryRbacStore::new(AssociationSchema::Bare);
        store.add_role(3, "sales");
        store.add_permission(10, "roles.view");
        store.add_permission(11, "desks.view");

        let err = PermissionProvisioner::new(Arc::new(store))
            .grant_basic_permissions()
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::RoleNotFound));
    }

    #[tokio::test]
    async fn incomplete_catalog_fails_before_any_insert() {
        let store = InMemoryRbacStore::new(AssociationSchema::Bare);
        store.add_role(1, "admin");
        store.add_permission(10, "roles.view");
        let store = Arc::new(store);

        let err = PermissionProvisioner::new(store.clone())
            .grant_basic_permissions()
            .await
            .unwrap_err();

        match &err {
            ProvisionError::PermissionCatalogIncomplete { missing } => {
                assert_eq!(missing, &vec!["desks.view".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("desks.view"));
        assert!(store.associations().is_empty());
    }

    #[tokio::test]
    async fn insert_omits_active_when_column_absent() {
        let store = catalog(AssociationSchema::WithCreatedAt);

        let report = PermissionProvisioner::new(store.clone())
            .grant_basic_permissions()
            .await
            .unwrap();
        assert_eq!(report.inserted.len(), 2);

        for row in store.associations() {
            assert_eq!(row.active, None);
            assert!(row.created_at.is_some());
        }
    }

    #[tokio::test]
    async fn deactivated_grant_is_switched_back_on() {
        let store = catalog(AssociationSchema::WithActive);
        store.add_association(1, 10, Some(false));

        let provisioner = PermissionProvisioner::new(store.clone());
        let first = provisioner.grant_basic_permissions().await.unwrap();
        assert_eq!(first.inserted, vec!["desks.view"]);
        assert_eq!(first.reactivated, vec!["roles.view"]);

        let rows = store.associations();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.active == Some(true)));

        let second = provisioner.grant_basic_permissions().await.unwrap();
        assert!(second.inserted.is_empty());
        assert!(second.reactivated.is_empty());
    }

    #[tokio::test]
    async fn existing_grant_without_active_column_is_left_alone() {
        let store = catalog(AssociationSchema::Bare);
        store.add_association(1, 10, None);

        let report = PermissionProvisioner::new(store.clone())
            .grant_basic_permissions()
            .await
            .unwrap();
        assert_eq!(report.inserted, vec!["desks.view"]);
        assert!(report.reactivated.is_empty());
        assert_eq!(store.associations()[0].active, None);
    }

    #[tokio::test]
    async fn duplicate_key_on_insert_is_benign() {
        let store = catalog(AssociationSchema::Bare);
        // Another run already wrote roles.view, but this run's probe misses it.
        store.insert_behind_probe(1, 10);

        let report = PermissionProvisioner::new(store.clone())
            .grant_basic_permissions()
            .await
            .unwrap();
        assert_eq!(report.inserted, vec!["desks.view"]);
        assert_eq!(store.associations().len(), 2);
    }

    #[tokio::test]
    async fn store_fault_is_surfaced() {
        let store = catalog(AssociationSchema::Bare);
        store.fail_inserts(true);

        let err = PermissionProvisioner::new(store)
            .grant_basic_permissions()
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Store(RepoError::Db(_))));
    }

    #[tokio::test]
    async fn concurrent_runs_never_duplicate_rows() {
        let store = catalog(AssociationSchema::WithActive);
        let a = PermissionProvisioner::new(store.clone());
        let b = PermissionProvisioner::new(store.clone());

        let (ra, rb) = tokio::join!(a.grant_basic_permissions(), b.grant_basic_permissions());
        let (ra, rb) = (ra.unwrap(), rb.unwrap());

        assert_eq!(ra.inserted.len() + rb.inserted.len(), 2);
        assert_eq!(store.associations().len(), 2);
    }
}
