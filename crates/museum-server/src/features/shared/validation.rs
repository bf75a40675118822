//! Field-level input validation
//!
//! A [`Validator`] collects one message per field. Handlers run every check
//! they need, then call [`Validator::into_result`] and bail with `?`.
//!
//! # Examples
//!
//! ```rust,ignore
//! let mut v = Validator::new();
//! v.check(!input.title.is_empty(), "title", "must be provided");
//! v.check(input.age > 0, "age", "must be a positive integer");
//! v.into_result()?;
//! ```

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Shared message for required fields
pub const MUST_BE_PROVIDED: &str = "must be provided";

static EMAIL_RX: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .ok()
});

/// Field name to message, ordered by field name
pub type FieldErrors = BTreeMap<String, String>;

/// Validation failed for at least one field
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("validation failed for {} field(s)", .0.len())]
#[serde(transparent)]
pub struct ValidationErrors(pub FieldErrors);

impl ValidationErrors {
    /// Single-field failure
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.into(), message.into());
        Self(errors)
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

/// Accumulates field errors; the first message recorded for a field wins
#[derive(Debug, Clone, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(field.into()).or_insert_with(|| message.into());
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

/// Loose RFC 5322 shape check for email addresses
pub fn is_email(value: &str) -> bool {
    EMAIL_RX.as_ref().is_some_and(|rx| rx.is_match(value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_validator_is_valid() {
        let v = Validator::new();
        assert!(v.is_valid());
        assert!(v.into_result().is_ok());
    }

    #[test]
    fn test_first_message_per_field_wins() {
        let mut v = Validator::new();
        v.check(false, "page", "must be greater than zero");
        v.check(false, "page", "must be a maximum of 10 million");
        v.check(true, "page_size", "never recorded");

        assert!(!v.is_valid());
        let errors = v.into_result().unwrap_err();
        assert_eq!(errors.0.len(), 1);
        assert_eq!(errors.get("page"), Some("must be greater than zero"));
    }

    #[test]
    fn test_errors_serialize_as_flat_object() {
        let mut v = Validator::new();
        v.add_error("title", MUST_BE_PROVIDED);
        v.add_error("age", "must be a positive integer");
        let json = serde_json::to_value(v.into_result().unwrap_err()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"age": "must be a positive integer", "title": "must be provided"})
        );
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("curator@museum.example"));
        assert!(is_email("a.b+tag@dig-site.org"));
        assert!(!is_email("curator"));
        assert!(!is_email("curator@"));
        assert!(!is_email("@museum.example"));
        assert!(!is_email("two words@museum.example"));
    }
}
