//! In-memory directory and RBAC store used by unit and handler tests.
use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::rbac_repo::{PermissionRow, RoleRow};
use crate::services::auth::{CapabilityDirectory, Principal, PrincipalDirectory};
use crate::services::rbac::{AssociationSchema, RbacStore};

#[derive(Default)]
struct DirectoryState {
    principals: Vec<Principal>,
    // (principal_id, role, permissions)
    grants: Vec<(i64, String, Vec<String>)>,
    fail_lookups: bool,
    fail_capability_queries: bool,
    panic_on_lookup: bool,
    lookup_delay: Option<Duration>,
}

#[derive(Default)]
pub struct InMemoryDirectory {
    state: Mutex<DirectoryState>,
}

impl InMemoryDirectory {
    pub fn principal(id: i64, status: &str) -> Principal {
        Principal {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            status: status.to_string(),
            first_name: Some("Test".to_string()),
            last_name: None,
        }
    }

    pub fn add_principal(&self, principal: Principal) {
        self.state.lock().unwrap().principals.push(principal);
    }

    pub fn grant(&self, principal_id: i64, role: &str, permissions: &[&str]) {
        self.state.lock().unwrap().grants.push((
            principal_id,
            role.to_string(),
            permissions.iter().map(|p| p.to_string()).collect(),
        ));
    }

    pub fn get(&self, id: i64) -> Option<Principal> {
        let state = self.state.lock().unwrap();
        state.principals.iter().find(|p| p.id == id).cloned()
    }

    pub fn fail_lookups(&self, on: bool) {
        self.state.lock().unwrap().fail_lookups = on;
    }

    pub fn fail_capability_queries(&self, on: bool) {
        self.state.lock().unwrap().fail_capability_queries = on;
    }

    pub fn panic_on_lookup(&self, on: bool) {
        self.state.lock().unwrap().panic_on_lookup = on;
    }

    pub fn delay_lookups(&self, delay: Duration) {
        self.state.lock().unwrap().lookup_delay = Some(delay);
    }

    fn capability_names(
        &self,
        principal_id: i64,
        pick: impl Fn(&(i64, String, Vec<String>)) -> Vec<String>,
    ) -> RepoResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        if state.fail_capability_queries {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        let names: BTreeSet<String> = state
            .grants
            .iter()
            .filter(|g| g.0 == principal_id)
            .flat_map(&pick)
            .collect();
        Ok(names.into_iter().collect())
    }
}

#[async_trait]
impl PrincipalDirectory for InMemoryDirectory {
    async fn find(&self, id: i64) -> RepoResult<Option<Principal>> {
        let (fail, panic, delay) = {
            let state = self.state.lock().unwrap();
            (state.fail_lookups, state.panic_on_lookup, state.lookup_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if panic {
            panic!("directory lookup panicked");
        }
        if fail {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        Ok(self.get(id))
    }
}

#[async_trait]
impl CapabilityDirectory for InMemoryDirectory {
    async fn roles_for(&self, principal_id: i64) -> RepoResult<Vec<String>> {
        self.capability_names(principal_id, |g| vec![g.1.clone()])
    }

    async fn permissions_for(&self, principal_id: i64) -> RepoResult<Vec<String>> {
        self.capability_names(principal_id, |g| g.2.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationRow {
    pub role_id: i64,
    pub permission_id: i64,
    pub active: Option<bool>,
    pub created_at: Option<DateTime<Utc>>,
}

struct RbacState {
    roles: Vec<RoleRow>,
    permissions: Vec<PermissionRow>,
    associations: Vec<AssociationRow>,
    // Rows the existence probe does not see (written by a concurrent run).
    hidden_from_probe: HashSet<(i64, i64)>,
    fail_inserts: bool,
}

pub struct InMemoryRbacStore {
    schema: AssociationSchema,
    state: Mutex<RbacState>,
}

impl InMemoryRbacStore {
    pub fn new(schema: AssociationSchema) -> Self {
        Self {
            schema,
            state: Mutex::new(RbacState {
                roles: Vec::new(),
                permissions: Vec::new(),
                associations: Vec::new(),
                hidden_from_probe: HashSet::new(),
                fail_inserts: false,
            }),
        }
    }

    pub fn add_role(&self, id: i64, name: &str) {
        self.state.lock().unwrap().roles.push(RoleRow {
            id,
            name: name.to_string(),
        });
    }

    pub fn add_permission(&self, id: i64, name: &str) {
        self.state.lock().unwrap().permissions.push(PermissionRow {
            id,
            name: name.to_string(),
        });
    }

    pub fn insert_behind_probe(&self, role_id: i64, permission_id: i64) {
        let mut state = self.state.lock().unwrap();
        state.associations.push(AssociationRow {
            role_id,
            permission_id,
            active: None,
            created_at: None,
        });
        state.hidden_from_probe.insert((role_id, permission_id));
    }

    pub fn add_association(&self, role_id: i64, permission_id: i64, active: Option<bool>) {
        self.state.lock().unwrap().associations.push(AssociationRow {
            role_id,
            permission_id,
            active,
            created_at: None,
        });
    }

    pub fn fail_inserts(&self, on: bool) {
        self.state.lock().unwrap().fail_inserts = on;
    }

    pub fn associations(&self) -> Vec<AssociationRow> {
        self.state.lock().unwrap().associations.clone()
    }

    fn columns(&self) -> Vec<String> {
        let mut columns = vec!["id".to_string(), "role_id".into(), "permission_id".into()];
        if self.schema.has_active() {
            columns.push("active".into());
        }
        if self.schema.has_created_at() {
            columns.push("created_at".into());
        }
        columns
    }
}

#[async_trait]
impl RbacStore for InMemoryRbacStore {
    async fn roles_named(&self, names: &[&str]) -> RepoResult<Vec<RoleRow>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .roles
            .iter()
            .filter(|r| names.contains(&r.name.as_str()))
            .cloned()
            .collect())
    }

    async fn permissions_named(&self, names: &[&str]) -> RepoResult<Vec<PermissionRow>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .permissions
            .iter()
            .filter(|p| names.contains(&p.name.as_str()))
            .cloned()
            .collect())
    }

    async fn association_columns(&self) -> RepoResult<Vec<String>> {
        Ok(self.columns())
    }

    async fn association_exists(&self, role_id: i64, permission_id: i64) -> RepoResult<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.associations.iter().any(|a| {
            a.role_id == role_id
                && a.permission_id == permission_id
                && !state.hidden_from_probe.contains(&(role_id, permission_id))
        }))
    }

    async fn reactivate_association(&self, role_id: i64, permission_id: i64) -> RepoResult<bool> {
        let mut state = self.state.lock().unwrap();
        let row = state.associations.iter_mut().find(|a| {
            a.role_id == role_id && a.permission_id == permission_id && a.active != Some(true)
        });
        Ok(match row {
            Some(row) => {
                row.active = Some(true);
                true
            }
            None => false,
        })
    }

    async fn insert_association(
        &self,
        schema: AssociationSchema,
        role_id: i64,
        permission_id: i64,
        now: DateTime<Utc>,
    ) -> RepoResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_inserts {
            return Err(RepoError::Db(sqlx::Error::PoolTimedOut));
        }
        // Stands in for UNIQUE (role_id, permission_id).
        if state
            .associations
            .iter()
            .any(|a| a.role_id == role_id && a.permission_id == permission_id)
        {
            return Err(RepoError::Conflict);
        }
        // A statement naming a column the table lacks would fail in a real store.
        if (schema.has_active() && !self.schema.has_active())
            || (schema.has_created_at() && !self.schema.has_created_at())
        {
            return Err(RepoError::Db(sqlx::Error::ColumnNotFound(
                "active/created_at".into(),
            )));
        }
        state.associations.push(AssociationRow {
            role_id,
            permission_id,
            active: schema.has_active().then_some(true),
            created_at: schema.has_created_at().then_some(now),
        });
        Ok(())
    }
}
