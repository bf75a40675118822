//! Integration tests for users, tokens and request authentication

mod helpers;

use axum::http::{header, Method, StatusCode};
use helpers::{get, post_json, put_json, request, TestApp};
use serde_json::json;

async fn register(app: &TestApp, email: &str) -> String {
    let (status, _, json) = app
        .send(post_json(
            "/v1/users",
            None,
            json!({"name": "Curator", "email": email, "password": "pa55word!"}),
        ))
        .await;
    assert_eq!(status, StatusCode::ACCEPTED, "{json}");
    json["activation_token"]["token"].as_str().unwrap().to_string()
}

async fn login(app: &TestApp, email: &str, password: &str) -> (StatusCode, serde_json::Value) {
    let (status, _, json) = app
        .send(post_json(
            "/v1/tokens/login",
            None,
            json!({"email": email, "password": password}),
        ))
        .await;
    (status, json)
}

#[tokio::test]
async fn test_healthcheck_is_public() {
    let app = TestApp::new();

    let (status, headers, json) = app.send(get("/v1/healthcheck", None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "available");
    assert_eq!(json["system_info"]["environment"], "testing");
    assert!(json["system_info"]["version"].is_string());
    assert_eq!(headers[header::VARY], "Authorization");
}

#[tokio::test]
async fn test_unknown_route_is_json_not_found() {
    let app = TestApp::new();

    let (status, _, json) = app.send(get("/v1/paintings", None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json, json!({"error": "the requested resource could not be found"}));
}

#[tokio::test]
async fn test_unsupported_method_is_json() {
    let app = TestApp::new();

    let (status, headers, json) = app
        .send(request(Method::PATCH, "/v1/researchers", None, None))
        .await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(headers.contains_key(header::ALLOW));
    assert_eq!(json["error"], "the PATCH method is not supported for this resource");
}

#[tokio::test]
async fn test_anonymous_request_requires_authentication() {
    let app = TestApp::new();

    let (status, _, json) = app.send(get("/v1/researchers", None)).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "you must be authenticated to access this resource");
}

#[tokio::test]
async fn test_unknown_token_is_rejected_with_challenge() {
    let app = TestApp::new();
    let bogus = "Z".repeat(32);

    for token in [bogus.as_str(), "short"] {
        let (status, headers, json) = app.send(get("/v1/healthcheck", Some(token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(headers[header::WWW_AUTHENTICATE], "Bearer");
        assert_eq!(json["error"], "invalid or missing authentication token");
    }
}

#[tokio::test]
async fn test_inactive_account_is_forbidden() {
    let app = TestApp::new();
    let token = app.seed_user("new@museum.example", false, &["read"]).await;

    let (status, _, json) = app.send(get("/v1/researchers", Some(&token))).await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        json["error"],
        "your user account must be activated to access this resource"
    );
}

#[tokio::test]
async fn test_read_only_user_cannot_write() {
    let app = TestApp::new();
    let token = app.seed_user("reader@museum.example", true, &["read"]).await;

    let (status, _, _) = app.send(get("/v1/artifacts", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _, json) = app
        .send(post_json(
            "/v1/researchers",
            Some(&token),
            json!({"name": "A. Lee", "project": "Dig"}),
        ))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(
        json["error"],
        "your user account doesn't have the necessary permissions to access this resource"
    );
    assert_eq!(app.store.researcher_count(), 0);
}

#[tokio::test]
async fn test_register_activate_login_flow() {
    let app = TestApp::new();
    let activation = register(&app, "curator@museum.example").await;

    let (status, json) = login(&app, "curator@museum.example", "pa55word!").await;
    assert_eq!(status, StatusCode::CREATED);
    let token = json["authentication_token"]["token"].as_str().unwrap().to_string();
    assert!(json["authentication_token"]["expiry"].is_string());

    // registered but not yet activated
    let (status, _, _) = app.send(get("/v1/researchers", Some(&token))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _, json) = app
        .send(put_json("/v1/users/activated", None, json!({"token": activation})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["user"]["activated"], true);
    assert!(json["user"].get("password_hash").is_none());

    let (status, _, _) = app.send(get("/v1/researchers", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);

    // activation tokens are single use
    let (status, _, json) = app
        .send(put_json("/v1/users/activated", None, json!({"token": activation})))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["token"], "invalid or expired activation token");
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let app = TestApp::new();
    register(&app, "curator@museum.example").await;

    let (status, _, json) = app
        .send(post_json(
            "/v1/users",
            None,
            json!({"name": "Other", "email": "curator@museum.example", "password": "pa55word!"}),
        ))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["error"]["email"],
        "a user with this email address already exists"
    );
}

#[tokio::test]
async fn test_register_validation() {
    let app = TestApp::new();

    let (status, _, json) = app
        .send(post_json(
            "/v1/users",
            None,
            json!({"name": "", "email": "not-an-email", "password": "short"}),
        ))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["name"], "must be provided");
    assert_eq!(json["error"]["email"], "must be a valid email address");
    assert_eq!(json["error"]["password"], "must be at least 8 bytes long");
}

#[tokio::test]
async fn test_login_with_bad_credentials() {
    let app = TestApp::new();
    register(&app, "curator@museum.example").await;

    let (status, json) = login(&app, "curator@museum.example", "wrong-password").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "invalid authentication credentials");

    let (status, _) = login(&app, "nobody@museum.example", "pa55word!").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_activation_token_format_is_validated() {
    let app = TestApp::new();

    let (status, _, json) = app
        .send(put_json("/v1/users/activated", None, json!({"token": "abc"})))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["error"]["token"], "must be 32 bytes long");
}

#[tokio::test]
async fn test_failed_registration_leaves_no_account() {
    let app = TestApp::new();
    app.store.fail_token_writes(true);

    let body = json!({"name": "Curator", "email": "curator@museum.example", "password": "pa55word!"});
    let (status, _, json) = app.send(post_json("/v1/users", None, body.clone())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json["error"],
        "the server encountered a problem and could not process your request"
    );
    assert_eq!(app.store.user_count(), 0);

    // the same email can be registered once the store recovers
    app.store.fail_token_writes(false);
    let (status, _, json) = app.send(post_json("/v1/users", None, body)).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert!(json["activation_token"]["token"].is_string());
    assert_eq!(app.store.user_count(), 1);
}

#[tokio::test]
async fn test_email_matching_ignores_case() {
    let app = TestApp::new();
    register(&app, "Curator@Museum.example").await;

    let (status, _, json) = app
        .send(post_json(
            "/v1/users",
            None,
            json!({"name": "Other", "email": "curator@museum.example", "password": "pa55word!"}),
        ))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        json["error"]["email"],
        "a user with this email address already exists"
    );

    let (status, _) = login(&app, "CURATOR@museum.example", "pa55word!").await;
    assert_eq!(status, StatusCode::CREATED);
}
