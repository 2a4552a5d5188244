// crates/server/src/handlers.rs
//! Notification-feed consumers wired into the HTTP status surface.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use plexpulse_stream::{ActivityHandler, HandlerError, TimelineHandler};

/// Lock-free counters of processed notification frames, read by the
/// status route.
#[derive(Debug, Default)]
pub struct FrameCounters {
    playing: AtomicU64,
    timeline: AtomicU64,
}

impl FrameCounters {
    pub fn playing(&self) -> u64 {
        self.playing.load(Ordering::Relaxed)
    }

    pub fn timeline(&self) -> u64 {
        self.timeline.load(Ordering::Relaxed)
    }
}

/// Handler that counts and logs notification payloads.
pub struct LoggingActivityHandler {
    counters: Arc<FrameCounters>,
}

impl LoggingActivityHandler {
    pub fn new(counters: Arc<FrameCounters>) -> Self {
        Self { counters }
    }
}

impl ActivityHandler for LoggingActivityHandler {
    fn on_playing(&self, payload: Value) -> Result<(), HandlerError> {
        self.counters.playing.fetch_add(1, Ordering::Relaxed);
        debug!(
            session_key = payload.get("sessionKey").and_then(serde_json::Value::as_str),
            state = payload.get("state").and_then(serde_json::Value::as_str),
            "play session update"
        );
        Ok(())
    }
}

impl TimelineHandler for LoggingActivityHandler {
    fn on_timeline(&self, payload: Value) -> Result<(), HandlerError> {
        self.counters.timeline.fetch_add(1, Ordering::Relaxed);
        debug!(
            item_id = payload.get("itemID").and_then(serde_json::Value::as_str),
            "timeline update"
        );
        Ok(())
    }
}
