//! Memory API server entry point.

use std::path::PathBuf;

use mnemo::memory::core::config::MemoryConfig;
use mnemo::server::{AppState, DEFAULT_PORT, run_server_with_shutdown};
use tracing::warn;

fn config_from_env() -> MemoryConfig {
    let mut config = MemoryConfig::default();

    if let Ok(path) = std::env::var("MNEMO_DB_PATH") {
        config.storage.sqlite_path = PathBuf::from(path);
    }
    if let Ok(model) = std::env::var("MNEMO_EMBED_MODEL") {
        config.embedding.model = model;
    }
    if let Ok(base_url) = std::env::var("MNEMO_EMBED_URL") {
        config.embedding.base_url = Some(base_url);
    }
    if std::env::var("MNEMO_EMBED_DISABLED").is_ok_and(|v| v == "1" || v == "true") {
        config.embedding.enabled = false;
    }

    config
}

fn port_from_env() -> u16 {
    std::env::var("MNEMO_PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init();

    let config = config_from_env();
    let state = AppState::from_config(&config).await?;

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for shutdown signal: {err}");
        }
    };

    run_server_with_shutdown(state, port_from_env(), shutdown)
        .await
        .map_err(|err| anyhow::anyhow!(err))?;

    Ok(())
}
