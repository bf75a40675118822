//! Museum Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared plumbing for the museum catalogue workspace.
//!
//! - **Error Handling**: [`CommonError`] and the [`Result`] alias
//! - **Logging**: `tracing` subscriber setup driven by `LOG_*` variables
//! - **Secrets**: token generation, token hashing and password hashing
//!
//! # Example
//!
//! ```no_run
//! use museum_common::logging::{init_logging, LogConfig};
//! use museum_common::secret::{hash_password, verify_password};
//!
//! fn main() -> anyhow::Result<()> {
//!     init_logging(&LogConfig::from_env()?)?;
//!
//!     let hash = hash_password("correct horse battery")?;
//!     assert!(verify_password("correct horse battery", &hash)?);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod logging;
pub mod secret;

// Re-export commonly used types
pub use error::{CommonError, Result};
