pub mod extract;
pub mod response;

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::get,
    Router,
};
use sqlx::PgPool;
use tokio::sync::Notify;
use tower_http::compression::CompressionLayer;

use crate::auth;
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::features::{
    self,
    artifacts::{ArtifactRepository, PgArtifactRepository},
    expeditions::{ExpeditionRepository, PgExpeditionRepository},
    permissions::{PermissionRepository, PgPermissionRepository},
    researchers::{PgResearcherRepository, ResearcherRepository},
    tokens::{PgTokenRepository, TokenRepository},
    users::{PgUserRepository, UserRepository},
};
use crate::middleware;
use response::Envelope;

/// Shared state for all routes
#[derive(Clone)]
pub struct AppState {
    pub researchers: Arc<dyn ResearcherRepository>,
    pub expeditions: Arc<dyn ExpeditionRepository>,
    pub artifacts: Arc<dyn ArtifactRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub permissions: Arc<dyn PermissionRepository>,
    /// Deployment environment reported by the healthcheck
    pub environment: String,
}

impl AppState {
    /// PostgreSQL-backed repositories sharing one pool
    pub fn from_pool(pool: PgPool, config: &Config) -> Self {
        let timeout = config.database.query_timeout();
        Self {
            researchers: Arc::new(PgResearcherRepository::new(pool.clone(), timeout)),
            expeditions: Arc::new(PgExpeditionRepository::new(pool.clone(), timeout)),
            artifacts: Arc::new(PgArtifactRepository::new(pool.clone(), timeout)),
            users: Arc::new(PgUserRepository::new(pool.clone(), timeout)),
            tokens: Arc::new(PgTokenRepository::new(pool.clone(), timeout)),
            permissions: Arc::new(PgPermissionRepository::new(pool, timeout)),
            environment: config.server.environment.clone(),
        }
    }

    /// One value implementing every repository, e.g. an in-memory store
    pub fn from_store<S>(store: Arc<S>, environment: impl Into<String>) -> Self
    where
        S: ResearcherRepository
            + ExpeditionRepository
            + ArtifactRepository
            + UserRepository
            + TokenRepository
            + PermissionRepository
            + 'static,
    {
        Self {
            researchers: store.clone(),
            expeditions: store.clone(),
            artifacts: store.clone(),
            users: store.clone(),
            tokens: store.clone(),
            permissions: store,
            environment: environment.into(),
        }
    }
}

/// Routes plus authentication and error shaping, without transport layers
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/healthcheck", get(healthcheck))
        .merge(features::router())
        .fallback(not_found)
        .layer(axum::middleware::from_fn_with_state(state.clone(), auth::authenticate))
        .layer(axum::middleware::from_fn(middleware::method_not_allowed_envelope))
        .layer(DefaultBodyLimit::max(extract::MAX_BODY_BYTES))
        .with_state(state)
}

/// Full application: [`router`] wrapped in compression, tracing and CORS
pub fn app(state: AppState, config: &Config) -> Router {
    router(state)
        .layer(CompressionLayer::new())
        .layer(middleware::tracing_layer())
        .layer(middleware::cors_layer(&config.cors))
}

pub async fn serve(config: Config, state: AppState) -> anyhow::Result<()> {
    let app = app(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!(%addr, environment = %config.server.environment, "Server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown = Arc::new(Notify::new());
    let signal = {
        let shutdown = shutdown.clone();
        async move {
            shutdown_signal().await;
            shutdown.notify_one();
        }
    };
    let server = axum::serve(listener, app).with_graceful_shutdown(signal).into_future();

    let limit = Duration::from_secs(config.server.shutdown_timeout_secs);
    if drain_within(server, shutdown, limit).await? {
        tracing::info!("Server shut down gracefully");
    } else {
        tracing::warn!(
            timeout_secs = config.server.shutdown_timeout_secs,
            "Connections still open after shutdown timeout, closing them"
        );
    }
    Ok(())
}

/// Runs `server` to completion, allowing at most `limit` for in-flight
/// requests once `shutdown` is notified. `Ok(false)` means the limit ran out
/// and the remaining connections were dropped.
async fn drain_within<F>(server: F, shutdown: Arc<Notify>, limit: Duration) -> std::io::Result<bool>
where
    F: Future<Output = std::io::Result<()>>,
{
    let deadline = async {
        shutdown.notified().await;
        tracing::info!("Waiting up to {} seconds for connections to close", limit.as_secs());
        tokio::time::sleep(limit).await;
    };

    tokio::select! {
        result = server => result.map(|()| true),
        () = deadline => Ok(false),
    }
}

async fn healthcheck(State(state): State<AppState>) -> AppResult<Envelope> {
    Envelope::ok().with("status", "available")?.with(
        "system_info",
        &serde_json::json!({
            "environment": state.environment,
            "version": env!("CARGO_PKG_VERSION"),
        }),
    )
}

async fn not_found() -> AppError {
    AppError::NotFound
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
