// crates/server/src/lib.rs
//! Plexpulse server library.
//!
//! Axum-based HTTP surface over the history database and the Plex
//! activity listener.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::*;
pub use handlers::{FrameCounters, LoggingActivityHandler};
pub use routes::api_routes;
pub use state::AppState;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the Axum application with all routes and middleware.
///
/// This sets up:
/// - API routes (health, status, tables)
/// - CORS for development (allows any origin)
/// - Request tracing
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(api_routes(state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
