//! API route handlers for the plexpulse server.

pub mod health;
pub mod status;
pub mod tables;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Create the combined API router with all routes under /api prefix.
///
/// Routes:
/// - GET /api/health - Health check
/// - GET /api/status - Activity listener connection state
/// - POST /api/reconnect - Ask the listener to reconnect
/// - POST /api/history - Paginated playback history table
/// - POST /api/users - Paginated user table
/// - POST /api/libraries - Paginated library-section table
pub fn api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", health::router())
        .nest("/api", status::router())
        .nest("/api", tables::router())
        .with_state(state)
}
