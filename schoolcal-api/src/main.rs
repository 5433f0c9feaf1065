//! schoolcal-api - HTTP service for the school calendar tracker
//!
//! Serves the scraping-workflow API over the shared SQLite database. Batch
//! maintenance lives in schoolcal-ops.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;

use schoolcal_api::{build_router, AppState};
use schoolcal_common::config::resolve_database_path;
use schoolcal_common::db::init_database;

/// Command-line arguments for schoolcal-api
#[derive(Parser, Debug)]
#[command(name = "schoolcal-api")]
#[command(about = "HTTP API for the UK school calendar tracker")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5800", env = "SCHOOLCAL_API_PORT")]
    port: u16,

    /// Path to the SQLite database (falls back to SCHOOLCAL_DB, then the
    /// platform data directory)
    #[arg(short, long, env = "SCHOOLCAL_DB")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting schoolcal-api v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let db_path = resolve_database_path(args.database.as_ref());
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(pool);
    let app = build_router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("schoolcal-api listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
