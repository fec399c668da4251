//! Taxonomy Query API (taxonomy-api) - Main entry point
//!
//! Read-only REST API over the taxonomy database. The verifier owns all
//! writes; this service only answers queries.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use taxonomy_api::{build_router, AppState};
use taxonomy_common::config::{resolve_data_folder, DATABASE_FILE};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for taxonomy-api
#[derive(Parser, Debug)]
#[command(name = "taxonomy-api")]
#[command(about = "REST query API for the taxonomy platform")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "5780", env = "TAXONOMY_API_PORT")]
    port: u16,

    /// Data folder containing the taxonomy database
    #[arg(short, long, env = "TAXONOMY_DATA_FOLDER")]
    data_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taxonomy_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Taxonomy Query API v{}", env!("CARGO_PKG_VERSION"));

    let data_folder = resolve_data_folder(args.data_folder.as_deref(), "TAXONOMY_DATA_FOLDER");
    let db_path = data_folder.join(DATABASE_FILE);
    info!("Database path: {}", db_path.display());

    let pool = taxonomy_api::db::connect_readonly(&db_path)
        .await
        .context("Failed to open database")?;
    info!("Connected to database (read-only)");

    let state = AppState::new(pool);
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("taxonomy-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
