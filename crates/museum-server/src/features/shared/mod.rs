//! Shared utilities and types for feature modules
//!
//! # Contents
//!
//! - **pagination**: sort safelists, validated filters and page metadata
//! - **query**: query-string extraction and typed readers
//! - **validation**: the per-request field validator
//! - **error_helpers**: database constraint classification

pub mod error_helpers;
pub mod pagination;
pub mod query;
pub mod validation;

// Re-export commonly used types
pub use pagination::{Filters, Metadata, Paginated, SortDirection, SortSafelist};
pub use query::QueryParams;
pub use validation::{ValidationErrors, Validator, MUST_BE_PROVIDED};
