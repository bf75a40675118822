//! Museum Server Library
//!
//! REST API for a museum catalogue: researchers, the expeditions they lead
//! and the artifacts they recover.
//!
//! # Overview
//!
//! - **API Endpoints**: CRUD for researchers, expeditions and artifacts under `/v1`
//! - **Listing**: full-text filters, safelisted sorting and page metadata
//! - **Auth**: Bearer tokens with `read` / `write` permissions
//! - **Database**: PostgreSQL through SQLx with embedded migrations
//!
//! # Architecture
//!
//! Every feature is a vertical slice under [`features`]:
//!
//! - `mod.rs` - the entity, its input type and validation rules
//! - `repository.rs` - an async repository trait plus its PostgreSQL implementation
//! - `routes.rs` - Axum handlers and the route table
//!
//! Handlers only see repositories through `Arc<dyn Trait>` in
//! [`api::AppState`], so the HTTP layer can be exercised against in-memory
//! test doubles.
//!
//! # Example
//!
//! ```no_run
//! use museum_server::{api, config::Config, db};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load()?;
//!     let pool = db::create_pool(&config.database).await?;
//!     let state = api::AppState::from_pool(pool, &config);
//!     api::serve(config, state).await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod features;
pub mod middleware;

// Re-export commonly used types
pub use error::{AppError, AppResult};
