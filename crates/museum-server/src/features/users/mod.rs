//! User accounts
//!
//! Accounts are created inactive with the `read` permission. The activation
//! token issued at registration flips them to active.

pub mod repository;
pub mod routes;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::validation::is_email;
use super::shared::{Validator, MUST_BE_PROVIDED};

pub use repository::{PgUserRepository, UserRepository};
pub use routes::users_routes;

/// Bytes accepted by Argon2 input in practice; longer passwords are refused.
pub const MAX_PASSWORD_BYTES: usize = 72;
pub const MIN_PASSWORD_BYTES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub activated: bool,
    #[serde(skip)]
    pub version: i32,
}

/// Account data ready to persist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActivateInput {
    pub token: String,
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(!email.is_empty(), "email", MUST_BE_PROVIDED);
    v.check(is_email(email), "email", "must be a valid email address");
}

pub fn validate_password_plaintext(v: &mut Validator, password: &str) {
    v.check(!password.is_empty(), "password", MUST_BE_PROVIDED);
    v.check(
        password.len() >= MIN_PASSWORD_BYTES,
        "password",
        "must be at least 8 bytes long",
    );
    v.check(
        password.len() <= MAX_PASSWORD_BYTES,
        "password",
        "must not be more than 72 bytes long",
    );
}

pub fn validate_registration(v: &mut Validator, input: &RegisterInput) {
    v.check(!input.name.is_empty(), "name", MUST_BE_PROVIDED);
    v.check(input.name.len() <= 500, "name", "must not be more than 500 bytes long");
    validate_email(v, &input.email);
    validate_password_plaintext(v, &input.password);
}
