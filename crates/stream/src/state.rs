// crates/stream/src/state.rs

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

/// Shared, observable state of the activity listener.
///
/// `connected` tracks the socket; `server_up` tracks the notification
/// side-channel (it only flips on a successful connect or a terminal
/// retry cycle, so IntUp/IntDown fire exactly once per transition).
#[derive(Debug, Default)]
pub struct ListenerState {
    connected: AtomicBool,
    server_up: AtomicBool,
    reconnect_attempts: AtomicU32,
    reconnect_requested: AtomicBool,
    cancel: CancellationToken,
}

impl ListenerState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    pub fn server_up(&self) -> bool {
        self.server_up.load(Ordering::SeqCst)
    }

    pub fn set_server_up(&self, up: bool) {
        self.server_up.store(up, Ordering::SeqCst);
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts.load(Ordering::SeqCst)
    }

    /// Record one failed connect attempt; returns the new count.
    pub(crate) fn record_failure(&self) -> u32 {
        self.reconnect_attempts.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn reset_attempts(&self) {
        self.reconnect_attempts.store(0, Ordering::SeqCst);
    }

    /// Ask the listener to drop its connection and start a fresh cycle.
    /// Safe from any thread; picked up after the next processed frame
    /// (or immediately, if the listener is parked after a terminal cycle).
    pub fn request_reconnect(&self) {
        self.reconnect_requested.store(true, Ordering::SeqCst);
    }

    pub(crate) fn take_reconnect_request(&self) -> bool {
        self.reconnect_requested.swap(false, Ordering::SeqCst)
    }

    /// Permanently stop the listener.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub(crate) async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }
}
