use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};

use super::{Token, TokenScope};
use crate::db::{with_timeout, DbResult};

#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn insert(&self, token: &Token) -> DbResult<()>;

    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> DbResult<()>;

    /// Generate, store and return a token valid for `ttl`
    async fn new_token(
        &self,
        user_id: i64,
        ttl: chrono::Duration,
        scope: TokenScope,
    ) -> DbResult<Token> {
        let token = Token::generate(user_id, ttl, scope);
        self.insert(&token).await?;
        Ok(token)
    }
}

/// Store `token` through `executor`, which may be an open transaction
pub(crate) async fn insert_token<'e, E>(executor: E, token: &Token) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query("INSERT INTO tokens (hash, user_id, expiry, scope) VALUES ($1, $2, $3, $4)")
        .bind(&token.hash)
        .bind(token.user_id)
        .bind(token.expiry)
        .bind(token.scope.as_str())
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn delete_tokens<'e, E>(
    executor: E,
    scope: TokenScope,
    user_id: i64,
) -> Result<(), sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query("DELETE FROM tokens WHERE scope = $1 AND user_id = $2")
        .bind(scope.as_str())
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgTokenRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgTokenRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

#[async_trait]
impl TokenRepository for PgTokenRepository {
    #[tracing::instrument(skip(self, token), fields(user_id = token.user_id, scope = token.scope.as_str()))]
    async fn insert(&self, token: &Token) -> DbResult<()> {
        with_timeout(self.timeout, insert_token(&self.pool, token)).await
    }

    #[tracing::instrument(skip(self, scope), fields(scope = scope.as_str()))]
    async fn delete_all_for_user(&self, scope: TokenScope, user_id: i64) -> DbResult<()> {
        with_timeout(self.timeout, delete_tokens(&self.pool, scope, user_id)).await
    }
}
