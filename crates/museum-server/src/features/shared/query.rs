//! Query-string reading helpers
//!
//! Values are trimmed. Absent or blank parameters fall back to a default.
//! Parameters that are present but not integers record
//! `"must be an integer value"` on the validator instead of failing the
//! request outright.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use axum::{extract::FromRequestParts, extract::Query, http::request::Parts};

use super::validation::Validator;
use crate::error::AppError;

pub const MUST_BE_INTEGER: &str = "must be an integer value";

/// Raw query-string parameters of a request
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self(params)
    }

    fn present(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(|s| s.trim()).filter(|s| !s.is_empty())
    }

    /// String parameter, `""` when absent
    pub fn string(&self, key: &str) -> String {
        self.string_or(key, "")
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.present(key).unwrap_or(default).to_string()
    }

    /// Integer parameter with a default
    pub fn int<T: FromStr>(&self, key: &str, default: T, v: &mut Validator) -> T {
        match self.present(key) {
            None => default,
            Some(raw) => raw.parse().unwrap_or_else(|_| {
                v.add_error(key, MUST_BE_INTEGER);
                default
            }),
        }
    }

    /// Integer parameter where absence means "do not filter"
    pub fn optional_int<T: FromStr>(&self, key: &str, v: &mut Validator) -> Option<T> {
        let raw = self.present(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                v.add_error(key, MUST_BE_INTEGER);
                None
            },
        }
    }
}

impl<const N: usize> From<[(&str, &str); N]> for QueryParams {
    fn from(pairs: [(&str, &str); N]) -> Self {
        Self(pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Query::<HashMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(params)| Self(params))
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_defaults() {
        let qs = QueryParams::from([("title", "bronze mask"), ("location", "")]);
        assert_eq!(qs.string("title"), "bronze mask");
        assert_eq!(qs.string("location"), "");
        assert_eq!(qs.string_or("sort", "artifact_id"), "artifact_id");
    }

    #[test]
    fn test_int_parses_or_records_error() {
        let qs = QueryParams::from([("page", "3"), ("page_size", "ten")]);
        let mut v = Validator::new();

        assert_eq!(qs.int("page", 1_i64, &mut v), 3);
        assert_eq!(qs.int("page_size", 20_i64, &mut v), 20);
        assert_eq!(qs.int("missing", 5_i64, &mut v), 5);

        assert_eq!(v.errors().get("page_size").map(String::as_str), Some(MUST_BE_INTEGER));
        assert!(!v.errors().contains_key("page"));
    }

    #[test]
    fn test_optional_int() {
        let qs = QueryParams::from([("age", "1200"), ("expedition_year", "soon")]);
        let mut v = Validator::new();

        assert_eq!(qs.optional_int::<i32>("age", &mut v), Some(1200));
        assert_eq!(qs.optional_int::<i32>("nothing", &mut v), None);
        assert_eq!(qs.optional_int::<i32>("expedition_year", &mut v), None);
        assert!(v.errors().contains_key("expedition_year"));
    }

    #[test]
    fn test_blank_values_count_as_absent() {
        let qs = QueryParams::from([("title", "   "), ("age", " 12 "), ("page", "\t"), ("sort", " -title ")]);
        let mut v = Validator::new();

        assert_eq!(qs.string("title"), "");
        assert_eq!(qs.string_or("sort", "id"), "-title");
        assert_eq!(qs.optional_int::<i32>("age", &mut v), Some(12));
        assert_eq!(qs.int("page", 1_i64, &mut v), 1);
        assert!(v.errors().is_empty());
    }
}
