//! API response types
//!
//! Success bodies are JSON objects keyed by what they carry, for example
//! `{"artifact": {...}}` or `{"artifacts": [...], "metadata": {...}}`.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{AppError, AppResult};

/// Keyed JSON envelope with a status code and optional `Location` header
#[derive(Debug)]
pub struct Envelope {
    status: StatusCode,
    location: Option<String>,
    body: Map<String, Value>,
}

impl Envelope {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            location: None,
            body: Map::new(),
        }
    }

    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// 201 pointing at the new resource
    pub fn created(location: impl Into<String>) -> Self {
        Self {
            location: Some(location.into()),
            ..Self::new(StatusCode::CREATED)
        }
    }

    pub fn accepted() -> Self {
        Self::new(StatusCode::ACCEPTED)
    }

    /// Add `key: value` to the body
    pub fn with<T: Serialize + ?Sized>(mut self, key: &str, value: &T) -> AppResult<Self> {
        let value = serde_json::to_value(value)
            .map_err(|e| AppError::Internal(format!("failed to encode '{}': {}", key, e)))?;
        self.body.insert(key.to_string(), value);
        Ok(self)
    }

    /// `{"message": "..."}`
    pub fn message(message: impl Into<String>) -> Self {
        let mut envelope = Self::ok();
        envelope.body.insert("message".to_string(), Value::String(message.into()));
        envelope
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for Envelope {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(Value::Object(self.body))).into_response();
        if let Some(location) = self.location {
            if let Ok(value) = HeaderValue::from_str(&location) {
                response.headers_mut().insert(header::LOCATION, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_created_sets_location() {
        let response = Envelope::created("/v1/artifacts/4")
            .with("artifact", &json!({"id": 4}))
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[header::LOCATION], "/v1/artifacts/4");
        assert_eq!(body_json(response).await, json!({"artifact": {"id": 4}}));
    }

    #[tokio::test]
    async fn test_message_envelope() {
        let response = Envelope::message("artifact successfully deleted").into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({"message": "artifact successfully deleted"})
        );
    }

    #[test]
    fn test_accepted_status() {
        assert_eq!(Envelope::accepted().status(), StatusCode::ACCEPTED);
    }
}
