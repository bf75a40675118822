//! Permission codes granted to users

pub mod repository;

use serde::Serialize;

pub use repository::{PermissionRepository, PgPermissionRepository};

pub const READ: &str = "read";
pub const WRITE: &str = "write";

/// Codes held by one user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Permissions(pub Vec<String>);

impl Permissions {
    pub fn includes(&self, code: &str) -> bool {
        self.0.iter().any(|c| c == code)
    }
}

impl From<Vec<String>> for Permissions {
    fn from(codes: Vec<String>) -> Self {
        Self(codes)
    }
}
