//! Database pool, error type and per-operation time budget
//!
//! Repositories never talk to `sqlx::Error` directly at their boundary; every
//! call is wrapped in [`with_timeout`] and returns a [`DbResult`].

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{FromRow, Row};
use thiserror::Error;

use crate::config::DatabaseConfig;

/// Database operation errors with contextual information
#[derive(Error, Debug)]
pub enum DbError {
    /// SQL query or connection error
    #[error("Database query failed: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// Database configuration is invalid or missing
    #[error("Database configuration error: {0}. Check DATABASE_URL and connection settings.")]
    Config(String),

    /// Requested record does not exist
    #[error("{0}")]
    NotFound(String),

    /// Record already exists (unique constraint violation)
    #[error("{0}")]
    Duplicate(String),

    /// A foreign key points at a row that does not exist
    #[error("{0} does not reference an existing record")]
    InvalidReference(&'static str),

    /// Optimistic concurrency check failed
    #[error("record was modified concurrently")]
    EditConflict,

    /// The operation exceeded its time budget
    #[error("Database operation timed out after {0:?}")]
    Timeout(Duration),
}

impl DbError {
    /// Create a not found error with resource context
    pub fn not_found(resource_type: &str, identifier: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{} '{}' not found in database", resource_type, identifier))
    }

    /// Create a duplicate error with resource context
    pub fn duplicate(resource_type: &str, identifier: &str) -> Self {
        Self::Duplicate(format!("{} '{}' already exists", resource_type, identifier))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Run a store operation under `budget`.
///
/// On expiry the in-flight query future is dropped, which cancels it, and the
/// caller gets [`DbError::Timeout`].
pub async fn with_timeout<T, E, F>(budget: Duration, operation: F) -> DbResult<T>
where
    F: Future<Output = Result<T, E>>,
    E: Into<DbError>,
{
    match tokio::time::timeout(budget, operation).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => {
            tracing::warn!(budget_ms = budget.as_millis() as u64, "Database operation timed out");
            Err(DbError::Timeout(budget))
        },
    }
}

/// Split rows of a `count(*) OVER() AS total_records` query into
/// `(total_records, record)` pairs
pub fn counted_rows<T>(rows: Vec<PgRow>) -> DbResult<Vec<(i64, T)>>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    rows.iter()
        .map(|row| -> DbResult<(i64, T)> {
            Ok((row.try_get("total_records")?, T::from_row(row)?))
        })
        .collect()
}

pub async fn create_pool(config: &DatabaseConfig) -> DbResult<PgPool> {
    if config.url.is_empty() {
        return Err(DbError::Config("DATABASE_URL not set".to_string()));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await?;

    tracing::info!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        query_timeout_secs = config.query_timeout_secs,
        "Database connection pool created"
    );

    Ok(pool)
}

pub async fn health_check(pool: &PgPool) -> DbResult<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .map(|_| ())
        .map_err(DbError::from)
}
