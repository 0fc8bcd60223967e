//! # ob-api: Binary Entry Point
//!
//! Starts the Axum HTTP server for the publication API.
//! Binds to configurable port (default 8080).

use ob_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();
    let port = config.port;
    if config.debug_mode {
        tracing::warn!("OB_DEBUG_MODE enabled: report delivery ids are not checked");
    }

    // Absent DATABASE_URL means in-memory only.
    let db_pool = ob_api::db::init_pool().await.map_err(|e| {
        tracing::error!("Database initialization failed: {e}");
        e
    })?;

    let mut state = AppState::with_config(config, db_pool);

    if std::env::var("OB_METRICS_ENABLED")
        .map(|v| v.to_lowercase() != "false")
        .unwrap_or(true)
    {
        let handle = ob_api::middleware::metrics::install_recorder().map_err(|e| {
            tracing::error!("Metrics recorder installation failed: {e}");
            e
        })?;
        state = state.with_metrics(handle);
    }

    state.hydrate_from_db().await.map_err(|e| {
        tracing::error!("Database hydration failed: {e}");
        e
    })?;

    let app = ob_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Publication API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
