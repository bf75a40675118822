//! User API routes
//!
//! - `POST /v1/users` - Register an account (open)
//! - `PUT /v1/users/activated` - Activate an account with its token (open)

use axum::{
    extract::State,
    routing::{post, put},
    Router,
};

use museum_common::secret::hash_password;

use super::{validate_registration, ActivateInput, NewUser, RegisterInput};
use crate::api::extract::JsonBody;
use crate::api::response::Envelope;
use crate::api::AppState;
use crate::db::DbError;
use crate::error::{AppError, AppResult};
use crate::features::permissions::READ;
use crate::features::shared::{ValidationErrors, Validator};
use crate::features::tokens::{validate_token_plaintext, TokenScope};

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/users", post(register_user))
        .route("/v1/users/activated", put(activate_user))
}

/// Register a new account
///
/// # Request Body
///
/// ```json
/// { "name": "Curator", "email": "curator@museum.example", "password": "pa55word!" }
/// ```
///
/// # Response
///
/// - `202 Accepted` - `{"user": {...}, "activation_token": {"token", "expiry"}}`
/// - `422 Unprocessable Entity` - validation error or email already registered
#[tracing::instrument(skip_all)]
async fn register_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<RegisterInput>,
) -> AppResult<Envelope> {
    let mut v = Validator::new();
    validate_registration(&mut v, &input);
    v.into_result()?;

    let RegisterInput { name, email, password } = input;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password)).await??;

    let new_user = NewUser {
        name,
        email,
        password_hash,
    };
    let (user, token) = match state.users.register(&new_user, &[READ]).await {
        Ok(registered) => registered,
        Err(DbError::Duplicate(_)) => {
            return Err(ValidationErrors::single(
                "email",
                "a user with this email address already exists",
            )
            .into())
        },
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, "User registered");

    Envelope::accepted()
        .with("user", &user)?
        .with("activation_token", &token)
}

/// Activate an account
///
/// # Response
///
/// - `200 OK` - `{"user": {...}}` with `activated: true`
/// - `409 Conflict` - the account changed concurrently
/// - `422 Unprocessable Entity` - unknown or expired token
#[tracing::instrument(skip_all)]
async fn activate_user(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<ActivateInput>,
) -> AppResult<Envelope> {
    let mut v = Validator::new();
    validate_token_plaintext(&mut v, &input.token);
    v.into_result()?;

    let user = match state
        .users
        .get_for_token(TokenScope::Activation, &input.token)
        .await
    {
        Ok(user) => user,
        Err(DbError::NotFound(_)) => {
            return Err(AppError::from(ValidationErrors::single(
                "token",
                "invalid or expired activation token",
            )))
        },
        Err(e) => return Err(e.into()),
    };

    let user = state.users.activate(&user).await?;

    tracing::info!(user_id = user.id, "User activated");

    Envelope::ok().with("user", &user)
}
