//! Activation and authentication tokens
//!
//! Clients only ever see the plaintext; the store keeps its SHA-256 hash.

pub mod repository;
pub mod routes;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use museum_common::secret::{generate_token_plaintext, hash_token, TOKEN_PLAINTEXT_LEN};

use super::shared::{Validator, MUST_BE_PROVIDED};

pub use repository::{PgTokenRepository, TokenRepository};
pub use routes::tokens_routes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenScope {
    Activation,
    Authentication,
}

impl TokenScope {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenScope::Activation => "activation",
            TokenScope::Authentication => "authentication",
        }
    }

    /// How long a freshly issued token stays valid
    pub fn ttl(self) -> Duration {
        match self {
            TokenScope::Activation => Duration::days(3),
            TokenScope::Authentication => Duration::hours(24),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub hash: String,
    #[serde(skip)]
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    #[serde(skip)]
    pub scope: TokenScope,
}

impl Token {
    pub fn generate(user_id: i64, ttl: Duration, scope: TokenScope) -> Self {
        let plaintext = generate_token_plaintext();
        Self {
            hash: hash_token(&plaintext),
            plaintext,
            user_id,
            expiry: Utc::now() + ttl,
            scope,
        }
    }
}

pub fn validate_token_plaintext(v: &mut Validator, plaintext: &str) {
    v.check(!plaintext.is_empty(), "token", MUST_BE_PROVIDED);
    v.check(
        plaintext.len() == TOKEN_PLAINTEXT_LEN,
        "token",
        "must be 32 bytes long",
    );
}
