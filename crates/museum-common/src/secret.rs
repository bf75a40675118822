//! Token and password secrets
//!
//! Plaintext tokens are handed to clients exactly once; only their SHA-256
//! hash is persisted. Passwords are stored as Argon2 PHC strings.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{CommonError, Result};

/// Number of random bytes behind a token plaintext.
pub const TOKEN_ENTROPY_BYTES: usize = 16;

/// Length of a token plaintext once hex encoded.
pub const TOKEN_PLAINTEXT_LEN: usize = TOKEN_ENTROPY_BYTES * 2;

/// Generate a fresh token plaintext (lowercase hex).
pub fn generate_token_plaintext() -> String {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Hash a token plaintext for storage and lookup.
pub fn hash_token(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// Hash a password into an Argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CommonError::PasswordHash(e.to_string()))
}

/// Check a password against a stored PHC string.
///
/// A wrong password is `Ok(false)`; only an unreadable hash is an error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed =
        PasswordHash::new(stored_hash).map_err(|e| CommonError::MalformedHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CommonError::PasswordHash(e.to_string())),
    }
}
