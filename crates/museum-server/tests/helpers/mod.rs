//! Test helpers for museum server integration tests
//!
//! This module provides:
//! - An in-memory store implementing every repository trait
//! - App construction over that store
//! - Seeded users with authentication tokens
//! - Request builders and response decoding

#![allow(dead_code)]

pub mod store;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use museum_server::api::{self, AppState};
use museum_server::features::permissions::PermissionRepository;
use museum_server::features::tokens::{TokenRepository, TokenScope};
use museum_server::features::users::{NewUser, UserRepository};

pub use store::InMemoryStore;

pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::default());
        let state = AppState::from_store(store.clone(), "testing");
        Self {
            router: api::router(state),
            store,
        }
    }

    /// Send a request and decode the JSON body (`Null` when empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, headers, json)
    }

    /// Create a user holding `permissions` and return an authentication token
    pub async fn seed_user(&self, email: &str, activated: bool, permissions: &[&str]) -> String {
        let store = self.store.as_ref();
        let mut user = UserRepository::insert(
            store,
            &NewUser {
                name: "Test User".to_string(),
                email: email.to_string(),
                password_hash: museum_common::secret::hash_password("pa55word!").unwrap(),
            },
        )
        .await
        .unwrap();

        if activated {
            user.activated = true;
            user = UserRepository::update(store, &user).await.unwrap();
        }

        PermissionRepository::add_for_user(store, user.id, permissions)
            .await
            .unwrap();

        let scope = TokenScope::Authentication;
        store
            .new_token(user.id, scope.ttl(), scope)
            .await
            .unwrap()
            .plaintext
    }

    /// Activated user with read and write
    pub async fn curator_token(&self) -> String {
        self.seed_user("curator@museum.example", true, &["read", "write"])
            .await
    }
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, token, None)
}

pub fn delete(uri: &str, token: Option<&str>) -> Request<Body> {
    request(Method::DELETE, uri, token, None)
}

pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(Method::POST, uri, token, Some(body.to_string()))
}

pub fn put_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    request(Method::PUT, uri, token, Some(body.to_string()))
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
