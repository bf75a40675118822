//! Token API routes
//!
//! - `POST /v1/tokens/login` - Exchange credentials for an authentication token (open)

use axum::{extract::State, http::StatusCode, routing::post, Router};
use serde::Deserialize;

use museum_common::secret::verify_password;

use super::TokenScope;
use crate::api::extract::JsonBody;
use crate::api::response::Envelope;
use crate::api::AppState;
use crate::db::DbError;
use crate::error::{AppError, AppResult};
use crate::features::shared::Validator;
use crate::features::users::{validate_email, validate_password_plaintext};

pub fn tokens_routes() -> Router<AppState> {
    Router::new().route("/v1/tokens/login", post(create_authentication_token))
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Log in
///
/// # Response
///
/// - `201 Created` - `{"authentication_token": {"token", "expiry"}}`, valid 24 hours
/// - `401 Unauthorized` - unknown email or wrong password
/// - `422 Unprocessable Entity` - validation error
#[tracing::instrument(skip_all)]
async fn create_authentication_token(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginInput>,
) -> AppResult<Envelope> {
    let mut v = Validator::new();
    validate_email(&mut v, &input.email);
    validate_password_plaintext(&mut v, &input.password);
    v.into_result()?;

    let user = match state.users.get_by_email(&input.email).await {
        Ok(user) => user,
        Err(DbError::NotFound(_)) => return Err(AppError::InvalidCredentials),
        Err(e) => return Err(e.into()),
    };

    let stored_hash = user.password_hash.clone();
    let password = input.password;
    let matches =
        tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await??;
    if !matches {
        return Err(AppError::InvalidCredentials);
    }

    let scope = TokenScope::Authentication;
    let token = state.tokens.new_token(user.id, scope.ttl(), scope).await?;

    tracing::info!(user_id = user.id, "Authentication token issued");

    Envelope::new(StatusCode::CREATED).with("authentication_token", &token)
}
