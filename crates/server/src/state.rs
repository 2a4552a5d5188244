// crates/server/src/state.rs
//! Application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use plexpulse_db::Database;
use plexpulse_stream::ListenerState;

use crate::handlers::FrameCounters;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    /// Server start time for uptime tracking.
    pub start_time: Instant,
    /// Database handle for history/user/library queries.
    pub db: Database,
    /// Observable state of the Plex activity listener.
    pub listener: Arc<ListenerState>,
    /// Frame counters maintained by the notification handlers.
    pub activity: Arc<FrameCounters>,
}

impl AppState {
    /// Create a new application state wrapped in an Arc for sharing.
    pub fn new(
        db: Database,
        listener: Arc<ListenerState>,
        activity: Arc<FrameCounters>,
    ) -> Arc<Self> {
        Arc::new(Self {
            start_time: Instant::now(),
            db,
            listener,
            activity,
        })
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
