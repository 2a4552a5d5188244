// crates/server/src/routes/status.rs
//! Activity-listener status and reconnect control.

use std::sync::Arc;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use crate::state::AppState;

/// Response for GET /api/status.
#[derive(Debug, Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct StatusResponse {
    /// Whether the WebSocket to the Plex server is currently open.
    pub connected: bool,
    /// Whether the Plex server is considered reachable (flips only on
    /// connect success / terminal retry failure).
    pub server_up: bool,
    /// Consecutive failed connect attempts in the current cycle.
    pub reconnect_attempts: u32,
    pub playing_frames: u64,
    pub timeline_frames: u64,
}

/// GET /api/status - Connection state of the activity listener.
pub async fn listener_status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    Json(StatusResponse {
        connected: state.listener.is_connected(),
        server_up: state.listener.server_up(),
        reconnect_attempts: state.listener.reconnect_attempts(),
        playing_frames: state.activity.playing(),
        timeline_frames: state.activity.timeline(),
    })
}

/// POST /api/reconnect - Ask the listener to drop its connection and
/// start a fresh cycle (used after connection settings change).
pub async fn request_reconnect(
    State(state): State<Arc<AppState>>,
) -> Json<serde_json::Value> {
    state.listener.request_reconnect();
    tracing::info!("reconnect requested via API");
    Json(serde_json::json!({"status": "reconnect requested"}))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(listener_status))
        .route("/reconnect", post(request_reconnect))
}
