use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};

use super::Permissions;
use crate::db::{with_timeout, DbResult};

#[async_trait]
pub trait PermissionRepository: Send + Sync {
    async fn get_all_for_user(&self, user_id: i64) -> DbResult<Permissions>;

    /// Grant `codes`; codes that do not exist are ignored
    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> DbResult<()>;
}

/// Grant `codes` to `user_id` through `executor`, which may be an open transaction
pub(crate) async fn grant<'e, E>(executor: E, user_id: i64, codes: &[&str]) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
    sqlx::query(
        r#"
        INSERT INTO users_permissions (user_id, permission_id)
        SELECT $1, permissions.id FROM permissions WHERE permissions.code = ANY($2)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(codes)
    .execute(executor)
    .await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgPermissionRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgPermissionRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl PermissionRepository for PgPermissionRepository {
    #[tracing::instrument(skip(self))]
    async fn get_all_for_user(&self, user_id: i64) -> DbResult<Permissions> {
        let query = sqlx::query_scalar::<_, String>(
            r#"
            SELECT permissions.code
            FROM permissions
            INNER JOIN users_permissions ON users_permissions.permission_id = permissions.id
            WHERE users_permissions.user_id = $1
            ORDER BY permissions.code
            "#,
        )
        .bind(user_id);

        let codes = with_timeout(self.timeout, query.fetch_all(&self.pool)).await?;
        Ok(Permissions(codes))
    }

    #[tracing::instrument(skip(self))]
    async fn add_for_user(&self, user_id: i64, codes: &[&str]) -> DbResult<()> {
        with_timeout(self.timeout, grant(&self.pool, user_id, codes)).await
    }
}
