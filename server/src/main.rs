//! toolgen server binary

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use toolgen_api_gateway::ClaudeClient;
use toolgen_forge::Persister;
use toolgen_server::config::LoggingConfig;
use toolgen_server::{build_router, config_path, load_config, AppState};

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.json {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path();
    let config = load_config(&path)?;
    init_tracing(&config.logging);

    info!("toolgen server starting...");
    if !path.exists() {
        warn!("Config {} not found, using defaults", path.display());
    }

    if !config.project.root.is_dir() {
        warn!(
            "Project root {} does not exist; generation requests will fail",
            config.project.root.display()
        );
    }

    let claude = ClaudeClient::new(config.generation.clone());
    if !claude.is_available() {
        warn!(
            "{} is not set; generation requests will fail until it is",
            config.generation.api_key_env
        );
    }
    info!("Using model {}", claude.model_name());

    let writer_cancel = CancellationToken::new();
    let state = AppState {
        generator: Arc::new(claude),
        persister: Persister::spawn(config.project.clone(), writer_cancel.clone()),
    };
    let app = build_router(state, &config.server.allowed_origins);

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    info!("Listening on {}", config.server.bind);

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Shutdown requested");
        }
        signal.cancel();
    });

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server failed")?;

    writer_cancel.cancel();
    info!("toolgen server stopped");
    Ok(())
}
