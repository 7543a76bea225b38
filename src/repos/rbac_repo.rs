/*
 * Responsibility
 * - roles / permissions / role_permissions 向け SQLx 操作
 * - information_schema から role_permissions のカラム構成を読む
 * - AssociationSchema ごとに INSERT 文の形を切り替える
 * - active = FALSE の既存行は UPDATE で再有効化する
 * - unique violation (23505) は RepoError::Conflict へ
 */
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use crate::repos::error::{RepoError, RepoResult};
use crate::services::rbac::{AssociationSchema, RbacStore};

pub const ASSOCIATION_TABLE: &str = "role_permissions";

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct PermissionRow {
    pub id: i64,
    pub name: String,
}

/// INSERT shape for the detected schema. `$3` is `created_at` when present.
pub fn insert_statement(schema: AssociationSchema) -> &'static str {
    match schema {
        AssociationSchema::Bare => {
            r#"
            INSERT INTO role_permissions (role_id, permission_id)
            VALUES ($1, $2)
            "#
        }
        AssociationSchema::WithActive => {
            r#"
            INSERT INTO role_permissions (role_id, permission_id, active)
            VALUES ($1, $2, TRUE)
            "#
        }
        AssociationSchema::WithCreatedAt => {
            r#"
            INSERT INTO role_permissions (role_id, permission_id, created_at)
            VALUES ($1, $2, $3)
            "#
        }
        AssociationSchema::WithActiveAndCreatedAt => {
            r#"
            INSERT INTO role_permissions (role_id, permission_id, active, created_at)
            VALUES ($1, $2, TRUE, $3)
            "#
        }
    }
}

#[derive(Clone, Debug)]
pub struct PgRbacStore {
    pool: PgPool,
}

impl PgRbacStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[async_trait]
impl RbacStore for PgRbacStore {
    async fn roles_named(&self, names: &[&str]) -> RepoResult<Vec<RoleRow>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, name
            FROM roles
            WHERE name = ANY($1)
            "#,
        )
        .bind(owned(names))
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::Db)?;

        Ok(rows)
    }

    async fn permissions_named(&self, names: &[&str]) -> RepoResult<Vec<PermissionRow>> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT id, name
            FROM permissions
            WHERE name = ANY($1)
            "#,
        )
        .bind(owned(names))
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::Db)?;

        Ok(rows)
    }

    async fn association_columns(&self) -> RepoResult<Vec<String>> {
        // column_name is a sql_identifier domain; cast so it decodes as String
        let columns = sqlx::query_scalar::<_, String>(
            r#"
            SELECT column_name::text
            FROM information_schema.columns
            WHERE table_schema = current_schema()
              AND table_name = $1
            "#,
        )
        .bind(ASSOCIATION_TABLE)
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::Db)?;

        Ok(columns)
    }

    async fn association_exists(&self, role_id: i64, permission_id: i64) -> RepoResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM role_permissions
                WHERE role_id = $1 AND permission_id = $2
            )
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::Db)?;

        Ok(exists)
    }

    async fn reactivate_association(&self, role_id: i64, permission_id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE role_permissions
            SET active = TRUE
            WHERE role_id = $1 AND permission_id = $2 AND active IS NOT TRUE
            "#,
        )
        .bind(role_id)
        .bind(permission_id)
        .execute(&self.pool)
        .await
        .map_err(RepoError::Db)?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_association(
        &self,
        schema: AssociationSchema,
        role_id: i64,
        permission_id: i64,
        now: DateTime<Utc>,
    ) -> RepoResult<()> {
        let mut query = sqlx::query(insert_statement(schema))
            .bind(role_id)
            .bind(permission_id);
        if schema.has_created_at() {
            query = query.bind(now);
        }

        query
            .execute(&self.pool)
            .await
            .map_err(RepoError::from_sqlx)?;

        Ok(())
    }
}
