// crates/core/src/notify.rs
//! Events emitted by the Plex activity listener.

use serde::Serialize;

/// One classified notification frame from the Plex WebSocket feed.
///
/// Carries one hoisted payload object (one entry of the
/// `PlaySessionStateNotification` / `TimelineEntry` wrapper array)
/// unchanged. Frames with any other `type`, or with a missing wrapper,
/// never become an event — they are logged and dropped at the listener.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    /// A play-session state change (`type: "playing"`).
    Playing(serde_json::Value),
    /// A library timeline change (`type: "timeline"`).
    Timeline(serde_json::Value),
}

/// Internal notification side-channel actions.
///
/// Sent over the notify queue exactly once per server up/down transition,
/// guarded by the listener's `server_up` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyAction {
    /// The Plex server became reachable (`on_intup`).
    IntUp,
    /// The Plex server became unreachable (`on_intdown`).
    IntDown,
}

impl NotifyAction {
    /// Wire name used by the notification queue consumers.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyAction::IntUp => "on_intup",
            NotifyAction::IntDown => "on_intdown",
        }
    }
}
