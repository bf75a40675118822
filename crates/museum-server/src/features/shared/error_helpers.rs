//! Database error handling utilities
//!
//! Turns constraint violations reported by PostgreSQL into the matching
//! [`DbError`] kind so handlers can answer with a field error instead of a 500.
//!
//! # Examples
//!
//! ```rust,ignore
//! sqlx::query_as::<_, Artifact>(INSERT_SQL)
//!     .fetch_one(&pool)
//!     .await
//!     .map_err(|e| classify(e, "researcher_id"))?;
//! ```

use sqlx::Error as SqlxError;

use crate::db::DbError;

/// Result of checking for a database constraint violation
#[derive(Debug)]
pub enum ConstraintViolation {
    /// A unique constraint was violated
    UniqueViolation(Option<String>),
    /// A foreign key constraint was violated
    ForeignKeyViolation,
    /// No constraint violation - some other error occurred
    Other(SqlxError),
}

/// Check the type of database constraint violation
pub fn check_constraint_violation(error: SqlxError) -> ConstraintViolation {
    if let SqlxError::Database(ref db_err) = error {
        if db_err.is_unique_violation() {
            return ConstraintViolation::UniqueViolation(db_err.constraint().map(str::to_string));
        }
        if db_err.is_foreign_key_violation() {
            return ConstraintViolation::ForeignKeyViolation;
        }
    }
    ConstraintViolation::Other(error)
}

/// Map a write error, blaming `reference_field` for foreign key violations
pub fn classify(error: SqlxError, reference_field: &'static str) -> DbError {
    match check_constraint_violation(error) {
        ConstraintViolation::ForeignKeyViolation => DbError::InvalidReference(reference_field),
        ConstraintViolation::UniqueViolation(constraint) => DbError::Duplicate(
            constraint.unwrap_or_else(|| "unique constraint".to_string()),
        ),
        ConstraintViolation::Other(e) => DbError::Sqlx(e),
    }
}
