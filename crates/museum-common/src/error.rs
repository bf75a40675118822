//! Error types shared across the workspace

use thiserror::Error;

/// Result type alias for common operations
pub type Result<T> = std::result::Result<T, CommonError>;

#[derive(Error, Debug)]
pub enum CommonError {
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),

    #[error("Stored password hash is malformed: {0}")]
    MalformedHash(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
