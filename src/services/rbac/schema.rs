use crate::repos::error::RepoResult;
use crate::services::rbac::store::RbacStore;

pub const ACTIVE_COLUMN: &str = "active";
pub const CREATED_AT_COLUMN: &str = "created_at";

/// Which optional columns the role-permission table carries in this
/// deployment. Selects one of four insert statement shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssociationSchema {
    Bare,
    WithActive,
    WithCreatedAt,
    WithActiveAndCreatedAt,
}

impl AssociationSchema {
    pub fn new(has_active: bool, has_created_at: bool) -> Self {
        match (has_active, has_created_at) {
            (false, false) => Self::Bare,
            (true, false) => Self::WithActive,
            (false, true) => Self::WithCreatedAt,
            (true, true) => Self::WithActiveAndCreatedAt,
        }
    }

    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let (mut active, mut created_at) = (false, false);
        for column in columns {
            let column = column.as_ref();
            active |= column.eq_ignore_ascii_case(ACTIVE_COLUMN);
            created_at |= column.eq_ignore_ascii_case(CREATED_AT_COLUMN);
        }
        Self::new(active, created_at)
    }

    pub fn has_active(&self) -> bool {
        matches!(self, Self::WithActive | Self::WithActiveAndCreatedAt)
    }

    pub fn has_created_at(&self) -> bool {
        matches!(self, Self::WithCreatedAt | Self::WithActiveAndCreatedAt)
    }
}

/// Reads the association table's column set. One call per provisioning run.
pub struct SchemaIntrospector<'a> {
    store: &'a dyn RbacStore,
}

impl<'a> SchemaIntrospector<'a> {
    pub fn new(store: &'a dyn RbacStore) -> Self {
        Self { store }
    }

    pub async fn inspect(&self) -> RepoResult<AssociationSchema> {
        let columns = self.store.association_columns().await?;
        let schema = AssociationSchema::from_columns(&columns);
        tracing::debug!(?columns, ?schema, "role_permissions schema detected");
        Ok(schema)
    }
}
