// crates/server/src/main.rs
//! Plexpulse server binary.
//!
//! Opens the history database, spawns the Plex activity listener as a
//! background task, and serves the HTTP API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use plexpulse_db::Database;
use plexpulse_server::{create_app, AppState, FrameCounters, LoggingActivityHandler};
use plexpulse_stream::{ActivityListener, ListenerState, StreamConfig};

/// Default port for the server.
const DEFAULT_PORT: u16 = 8181;

/// Get the server port from environment or use default.
fn get_port() -> u16 {
    std::env::var("PLEXPULSE_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let db = match std::env::var("PLEXPULSE_DB") {
        Ok(path) => Database::new(&PathBuf::from(path)).await?,
        Err(_) => Database::open_default().await?,
    };

    let listener_state = ListenerState::new();
    let counters = Arc::new(FrameCounters::default());
    let handler = Arc::new(LoggingActivityHandler::new(counters.clone()));
    let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();

    ActivityListener::new(
        StreamConfig::from_env(),
        listener_state.clone(),
        handler.clone(),
        handler,
        notify_tx,
    )
    .spawn();

    // Drain the server up/down notifications.
    tokio::spawn(async move {
        while let Some(action) = notify_rx.recv().await {
            info!(action = action.as_str(), "Plex server transition");
        }
    });

    let state = AppState::new(db, listener_state, counters);
    let app = create_app(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], get_port()));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("plexpulse listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
