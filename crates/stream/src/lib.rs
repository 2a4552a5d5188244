// crates/stream/src/lib.rs
// Persistent WebSocket client for the Plex notification feed.
//
// A single tokio task owns the socket: it connects, classifies incoming
// frames, forwards hoisted payloads to the registered handlers, and
// reconnects with a bounded retry cycle when the connection drops.

pub mod config;
pub mod dispatch;
pub mod listener;
pub mod state;

pub use config::StreamConfig;
pub use dispatch::{classify_frame, ActivityHandler, HandlerError, TimelineHandler};
pub use listener::ActivityListener;
pub use state::ListenerState;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid X-Plex-Token header value")]
    BadToken(#[from] http::header::InvalidHeaderValue),
}

pub type StreamResult<T> = Result<T, StreamError>;
