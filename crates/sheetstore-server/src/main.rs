//! # sheetstore-server
//!
//! HTTP front for the sheet handlers. This binary provides:
//! - **Cell store** (`/cells`): grid cells keyed by tab, row and column,
//!   per-tab column names and a destructive full sync
//! - **Image store** (`/images`): base64 image attachments
//! - **Envelope invocation** (`/invoke/...`): function-runtime style events
//!   for either handler
//!
//! Every request opens its own SQLite connection and closes it before the
//! response is written.

mod api;
mod config;
mod error;
mod handlers;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sheetstore_server=debug")),
        )
        .init();

    info!(
        "Starting {} server v{}",
        sheetstore_shared::constants::APP_NAME,
        env!("CARGO_PKG_VERSION")
    );

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Check the database once so a bad DATABASE_URL fails at startup
    // -----------------------------------------------------------------------
    let state = AppState::new(config.clone());
    state
        .connector
        .open()
        .map_err(|e| anyhow::anyhow!("{e} (DATABASE_URL={})", config.database_url))?;
    info!(url = %config.database_url, "Database reachable");

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
