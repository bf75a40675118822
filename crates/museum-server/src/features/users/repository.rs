use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;

use museum_common::secret::hash_token;

use super::{NewUser, User};
use crate::db::{with_timeout, DbError, DbResult};
use crate::features::permissions::repository::grant;
use crate::features::shared::error_helpers::classify;
use crate::features::tokens::repository::{delete_tokens, insert_token};
use crate::features::tokens::{Token, TokenScope};

const USER_COLUMNS: &str = "id, created_at, name, email, password_hash, activated, version";

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// `Duplicate` when the email is taken, ignoring case
    async fn insert(&self, user: &NewUser) -> DbResult<User>;

    /// Case-insensitive lookup
    async fn get_by_email(&self, email: &str) -> DbResult<User>;

    /// Version-checked update; `EditConflict` when the stored version moved on
    async fn update(&self, user: &User) -> DbResult<User>;

    async fn get_for_token(&self, scope: TokenScope, plaintext: &str) -> DbResult<User>;

    /// Insert `user`, grant `permissions` and issue an activation token.
    ///
    /// Either all three writes happen or none does.
    async fn register(&self, user: &NewUser, permissions: &[&str]) -> DbResult<(User, Token)>;

    /// Mark `user` activated and revoke its activation tokens in one step
    async fn activate(&self, user: &User) -> DbResult<User>;
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }
}

fn email_error(error: sqlx::Error, email: &str) -> DbError {
    match classify(error, "email") {
        DbError::Duplicate(_) => DbError::duplicate("User", email),
        other => other,
    }
}

async fn insert_user<'e, E>(executor: E, user: &NewUser) -> DbResult<User>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (name, email, password_hash, activated) \
         VALUES ($1, $2, $3, FALSE) RETURNING {USER_COLUMNS}"
    ))
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .fetch_one(executor)
    .await
    .map_err(|e| email_error(e, &user.email))
}

async fn update_user<'e, E>(executor: E, user: &User) -> DbResult<User>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!(
        "UPDATE users \
         SET name = $1, email = $2, password_hash = $3, activated = $4, version = version + 1 \
         WHERE id = $5 AND version = $6 \
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(user.activated)
    .bind(user.id)
    .bind(user.version)
    .fetch_optional(executor)
    .await
    .map_err(|e| email_error(e, &user.email))?
    .ok_or(DbError::EditConflict)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[tracing::instrument(skip(self, user))]
    async fn insert(&self, user: &NewUser) -> DbResult<User> {
        with_timeout(self.timeout, insert_user(&self.pool, user)).await
    }

    #[tracing::instrument(skip(self, email))]
    async fn get_by_email(&self, email: &str) -> DbResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)");
        let query = sqlx::query_as::<_, User>(&sql).bind(email);

        with_timeout(self.timeout, query.fetch_optional(&self.pool))
            .await?
            .ok_or_else(|| DbError::not_found("User", email))
    }

    #[tracing::instrument(skip(self, user), fields(user_id = user.id, version = user.version))]
    async fn update(&self, user: &User) -> DbResult<User> {
        with_timeout(self.timeout, update_user(&self.pool, user)).await
    }

    #[tracing::instrument(skip(self, scope, plaintext), fields(scope = scope.as_str()))]
    async fn get_for_token(&self, scope: TokenScope, plaintext: &str) -> DbResult<User> {
        let query = sqlx::query_as::<_, User>(
            r#"
            SELECT users.id, users.created_at, users.name, users.email,
                   users.password_hash, users.activated, users.version
            FROM users
            INNER JOIN tokens ON users.id = tokens.user_id
            WHERE tokens.hash = $1
            AND tokens.scope = $2
            AND tokens.expiry > $3
            "#,
        )
        .bind(hash_token(plaintext))
        .bind(scope.as_str())
        .bind(Utc::now());

        with_timeout(self.timeout, query.fetch_optional(&self.pool))
            .await?
            .ok_or_else(|| DbError::NotFound("no user for token".to_string()))
    }

    #[tracing::instrument(skip(self, user))]
    async fn register(&self, user: &NewUser, permissions: &[&str]) -> DbResult<(User, Token)> {
        // Dropping the transaction on error or timeout rolls it back
        with_timeout(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            let created = insert_user(&mut *tx, user).await?;
            grant(&mut *tx, created.id, permissions).await?;

            let scope = TokenScope::Activation;
            let token = Token::generate(created.id, scope.ttl(), scope);
            insert_token(&mut *tx, &token).await?;

            tx.commit().await?;
            Ok::<_, DbError>((created, token))
        })
        .await
    }

    #[tracing::instrument(skip(self, user), fields(user_id = user.id))]
    async fn activate(&self, user: &User) -> DbResult<User> {
        with_timeout(self.timeout, async {
            let mut tx = self.pool.begin().await?;

            let activated = update_user(&mut *tx, &User {
                activated: true,
                ..user.clone()
            })
            .await?;
            delete_tokens(&mut *tx, TokenScope::Activation, activated.id).await?;

            tx.commit().await?;
            Ok::<_, DbError>(activated)
        })
        .await
    }
}
