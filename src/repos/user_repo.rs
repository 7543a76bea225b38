/*
 * Responsibility
 * - users / user_roles / role_permissions 向け SQLx 読み取り
 * - PrincipalDirectory + CapabilityDirectory の Postgres 実装
 * - DB エラーは RepoError として返す (401/verify_unavailable への変換は上位)
 */
use async_trait::async_trait;
use sqlx::{FromRow, PgPool};

use crate::repos::error::{RepoError, RepoResult};
use crate::services::auth::{CapabilityDirectory, Principal, PrincipalDirectory};
use crate::services::rbac::AssociationSchema;

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub status: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl From<UserRow> for Principal {
    fn from(row: UserRow) -> Self {
        Principal {
            id: row.id,
            username: row.username,
            email: row.email,
            status: row.status,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PgPrincipalDirectory {
    pool: PgPool,
    // Detected once at startup; decides whether inactive grants are filtered.
    schema: AssociationSchema,
}

impl PgPrincipalDirectory {
    pub fn new(pool: PgPool, schema: AssociationSchema) -> Self {
        Self { pool, schema }
    }
}

#[async_trait]
impl PrincipalDirectory for PgPrincipalDirectory {
    async fn find(&self, id: i64) -> RepoResult<Option<Principal>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, status, first_name, last_name
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::Db)?;

        Ok(row.map(Principal::from))
    }
}

#[async_trait]
impl CapabilityDirectory for PgPrincipalDirectory {
    async fn roles_for(&self, principal_id: i64) -> RepoResult<Vec<String>> {
        let roles = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.name
            "#,
        )
        .bind(principal_id)
        .fetch_all(&self.pool)
        .await
        .map_err(RepoError::Db)?;

        Ok(roles)
    }

    async fn permissions_for(&self, principal_id: i64) -> RepoResult<Vec<String>> {
        let sql = if self.schema.has_active() {
            r#"
            SELECT DISTINCT p.name
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = $1 AND rp.active = TRUE
            ORDER BY p.name
            "#
        } else {
            r#"
            SELECT DISTINCT p.name
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            JOIN user_roles ur ON ur.role_id = rp.role_id
            WHERE ur.user_id = $1
            ORDER BY p.name
            "#
        };

        let permissions = sqlx::query_scalar::<_, String>(sql)
            .bind(principal_id)
            .fetch_all(&self.pool)
            .await
            .map_err(RepoError::Db)?;

        Ok(permissions)
    }
}
