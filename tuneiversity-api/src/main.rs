//! tuneiversity-api - Mandarin song practice backend
//!
//! Serves the song/verse catalog, scores uploaded recordings and builds
//! practice reports.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tuneiversity_api::config::{CliOverrides, ServerConfig};
use tuneiversity_api::services::SessionStore;
use tuneiversity_api::{build_router, AppState};
use tuneiversity_common::config::{resolve_config_path, TomlConfig};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "tuneiversity-api")]
#[command(about = "Song practice and pronunciation scoring service")]
#[command(version)]
struct Args {
    /// Bootstrap TOML configuration file
    #[arg(short, long, env = "TUNEIVERSITY_CONFIG")]
    config: Option<PathBuf>,

    /// HTTP port
    #[arg(short, long, env = "TUNEIVERSITY_PORT")]
    port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "TUNEIVERSITY_BIND_ADDRESS")]
    bind_address: Option<String>,

    /// SQLite connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let toml_config = TomlConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    let config = ServerConfig::resolve(
        CliOverrides {
            port: args.port,
            bind_address: args.bind_address,
            database_url: args.database_url,
        },
        toml_config,
    );

    let default_filter = format!(
        "tuneiversity_api={level},tuneiversity_common={level},tower_http={level}",
        level = config.log_level
    );
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting tuneiversity-api v{} (git {}, built {}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );
    // Config is read before the subscriber exists, so report its source here
    match &config_path {
        Some(path) if path.exists() => info!("Config file: {}", path.display()),
        Some(path) => warn!("Config file not found: {} (using defaults)", path.display()),
        None => warn!("No config file location available (using defaults)"),
    }

    let db = tuneiversity_common::db::init_database(&config.database_url)
        .await
        .context("Failed to initialize database")?;

    let sessions = Arc::new(SessionStore::new());
    let state = AppState::from_settings(db, sessions, &config.scoring)
        .context("Failed to initialize scoring")?;
    let app = build_router(state, &config.http);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
