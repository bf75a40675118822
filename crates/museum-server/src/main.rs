//! Museum Server - Main entry point

use anyhow::Result;
use museum_common::logging::{init_logging, LogConfig};
use tracing::info;

use museum_server::{api, config::Config, db};

#[tokio::main]
async fn main() -> Result<()> {
    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("museum-server")
        .filter_directives("museum_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    init_logging(&log_config)?;

    info!("Starting museum server");

    let config = Config::load()?;
    info!(
        host = %config.server.host,
        port = config.server.port,
        environment = %config.server.environment,
        "Configuration loaded"
    );

    let pool = db::create_pool(&config.database).await?;

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;

    info!("Database migrations completed");

    let state = api::AppState::from_pool(pool, &config);
    api::serve(config, state).await
}
