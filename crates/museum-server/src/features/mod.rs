//! Feature modules implementing the museum API
//!
//! Each feature is a vertical slice with its own entity, repository and
//! routes.
//!
//! # Features
//!
//! - **researchers**: people who lead expeditions and recover artifacts
//! - **expeditions**: expeditions, filterable by title and year
//! - **artifacts**: artifacts, filterable by title, location and age
//! - **users**: registration and activation
//! - **tokens**: login and token issuing
//! - **permissions**: permission codes held by users

pub mod artifacts;
pub mod expeditions;
pub mod permissions;
pub mod researchers;
pub mod shared;
pub mod tokens;
pub mod users;

use axum::Router;

use crate::api::AppState;

/// Every feature route under `/v1`
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(researchers::researchers_routes())
        .merge(expeditions::expeditions_routes())
        .merge(artifacts::artifacts_routes())
        .merge(users::users_routes())
        .merge(tokens::tokens_routes())
}
