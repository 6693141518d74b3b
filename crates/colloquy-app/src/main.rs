//! Colloquy application binary - composition root.
//!
//! Ties together all Colloquy crates into a single executable:
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Open the SQLite database and run migrations
//! 3. Build the completion client (HTTP + retry/deadline wrapper)
//! 4. Start the axum REST API server

mod cli;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use colloquy_api::{routes, AppState};
use colloquy_core::config::ColloquyConfig;
use colloquy_provider::{HttpCompletionClient, RetryPolicy, RetryingClient};
use colloquy_storage::Database;

use cli::CliArgs;

/// Expand ~ to the home directory in a path string.
fn resolve_data_dir(data_dir: &str) -> PathBuf {
    if data_dir.starts_with("~/") || data_dir.starts_with("~\\") {
        #[cfg(target_os = "windows")]
        let home = std::env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string());
        #[cfg(not(target_os = "windows"))]
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(&data_dir[2..])
    } else {
        PathBuf::from(data_dir)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Config, with CLI and env overrides layered on top.
    let config_file = args.resolve_config_path();
    let mut config = ColloquyConfig::load_or_default(&config_file);
    config.general.port = args.resolve_port(config.general.port);
    if let Some(data_dir) = args.resolve_data_dir() {
        config.general.data_dir = data_dir;
    }
    if let Some(level) = args.resolve_log_level() {
        config.general.log_level = level;
    }
    if let Some(model) = args.model {
        config.provider.model = model;
    }
    if let Ok(key) = std::env::var("COLLOQUY_API_KEY") {
        config.provider.api_key = key;
    }

    // Tracing: RUST_LOG wins, then the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(config.general.log_level.clone())
            }),
        )
        .init();

    tracing::info!("Starting Colloquy v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(path = %config_file.display(), "Configuration loaded");

    // Storage.
    let data_dir = resolve_data_dir(&config.general.data_dir);
    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        tracing::error!(path = %data_dir.display(), error = %e, "Failed to create data directory");
        return Err(e.into());
    }

    let db_path = data_dir.join("colloquy.db");
    let db = Database::new(&db_path)?;
    tracing::info!(path = %db_path.display(), "SQLite database opened");

    // Completion client: HTTP transport behind the retry/deadline wrapper.
    if config.provider.api_key.is_empty() {
        tracing::warn!("No provider API key configured; completions will fail over to the fallback reply");
    }
    let http_client = HttpCompletionClient::new(
        config.provider.base_url.clone(),
        config.provider.api_key.clone(),
    );
    let policy = RetryPolicy {
        max_attempts: config.provider.max_attempts,
        backoff_base: Duration::from_millis(config.provider.backoff_base_ms),
        deadline: Duration::from_secs(config.provider.timeout_secs),
    };
    let client = Arc::new(RetryingClient::new(Arc::new(http_client), policy));
    tracing::info!(
        model = %config.provider.model,
        base_url = %config.provider.base_url,
        "Completion client ready"
    );

    // API server.
    let state = AppState::new(config, db, client);
    routes::start_server(state).await?;

    Ok(())
}
