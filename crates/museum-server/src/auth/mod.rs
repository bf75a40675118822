//! Bearer-token authentication and permission checks
//!
//! [`authenticate`] runs on every request and stores an [`AuthUser`] in the
//! request extensions. Handlers opt into authorization by taking a
//! [`RequirePermission`] extractor:
//!
//! ```rust,ignore
//! async fn create_artifact(
//!     _: RequirePermission<Write>,
//!     State(state): State<AppState>,
//!     JsonBody(input): JsonBody<ArtifactInput>,
//! ) -> AppResult<Envelope> { ... }
//! ```

use std::marker::PhantomData;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderValue},
    middleware::Next,
    response::Response,
};

use museum_common::secret::TOKEN_PLAINTEXT_LEN;

use crate::api::AppState;
use crate::db::DbError;
use crate::error::AppError;
use crate::features::permissions;
use crate::features::tokens::TokenScope;
use crate::features::users::User;

/// Who is making the request
#[derive(Debug, Clone)]
pub enum AuthUser {
    Anonymous,
    User(User),
}

impl AuthUser {
    pub fn is_anonymous(&self) -> bool {
        matches!(self, AuthUser::Anonymous)
    }
}

fn bearer_token(value: &HeaderValue) -> Option<&str> {
    let token = value.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    (token.len() == TOKEN_PLAINTEXT_LEN).then_some(token)
}

/// Resolve the `Authorization` header into an [`AuthUser`]
///
/// No header means anonymous. A header that is not `Bearer <token>`, or a
/// token that matches no unexpired authentication token, is a 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = match request.headers().get(header::AUTHORIZATION) {
        None => AuthUser::Anonymous,
        Some(value) => {
            let token = bearer_token(value).ok_or(AppError::InvalidAuthenticationToken)?;
            match state.users.get_for_token(TokenScope::Authentication, token).await {
                Ok(user) => AuthUser::User(user),
                Err(DbError::NotFound(_)) => return Err(AppError::InvalidAuthenticationToken),
                Err(e) => return Err(e.into()),
            }
        },
    };

    request.extensions_mut().insert(user);

    let mut response = next.run(request).await;
    response
        .headers_mut()
        .append(header::VARY, HeaderValue::from_static("Authorization"));
    Ok(response)
}

/// A permission code checked by [`RequirePermission`]
pub trait Permission {
    const CODE: &'static str;
}

/// `read` permission
#[derive(Debug, Clone, Copy)]
pub struct Read;

/// `write` permission
#[derive(Debug, Clone, Copy)]
pub struct Write;

impl Permission for Read {
    const CODE: &'static str = permissions::READ;
}

impl Permission for Write {
    const CODE: &'static str = permissions::WRITE;
}

/// Extractor that admits only activated users holding `P`
#[derive(Debug, Clone)]
pub struct RequirePermission<P> {
    pub user: User,
    _permission: PhantomData<P>,
}

#[async_trait]
impl<P> FromRequestParts<AppState> for RequirePermission<P>
where
    P: Permission + Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user = match parts.extensions.get::<AuthUser>() {
            Some(AuthUser::User(user)) => user.clone(),
            _ => return Err(AppError::AuthenticationRequired),
        };

        if !user.activated {
            return Err(AppError::InactiveAccount);
        }

        let granted = state.permissions.get_all_for_user(user.id).await?;
        if !granted.includes(P::CODE) {
            tracing::debug!(user_id = user.id, permission = P::CODE, "Permission denied");
            return Err(AppError::NotPermitted);
        }

        Ok(Self {
            user,
            _permission: PhantomData,
        })
    }
}
