use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use worldcast::api::{create_router, AppState};
use worldcast::config::{load_config, WorldConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worldcast=info".into()),
        )
        .init();

    info!("Worldcast starting...");

    let mut config = match std::env::var("WORLDCAST_CONFIG") {
        Ok(path) => {
            info!(path = %path, "Loading config file");
            load_config(&path).with_context(|| format!("Failed to load config from {}", path))?
        }
        Err(_) => WorldConfig::default(),
    };
    config.apply_env();

    let state = Arc::new(AppState::from_config(config.subscriber));
    let app = create_router(state, &config.server.static_dir);

    let listener = tokio::net::TcpListener::bind(&config.server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr))?;

    info!(
        addr = %config.server.bind_addr,
        queue_capacity = config.subscriber.queue_capacity,
        overflow_policy = ?config.subscriber.overflow_policy,
        "Listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Worldcast stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
