// crates/stream/src/dispatch.rs
// Frame classification and handler fan-out.
//
// Plex wraps notification payloads two levels deep: the frame may or may
// not carry a `NotificationContainer` envelope, and the payload objects
// sit inside a type-specific wrapper array (`PlaySessionStateNotification`
// for `playing`, `TimelineEntry` for `timeline`) or a generic `_children`
// array. Classification hoists the payload objects out; everything
// unrecognized is logged and dropped without erroring.

use serde_json::Value;
use tracing::{debug, warn};

use plexpulse_core::ActivityEvent;

pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Consumer of `playing` payloads (play-session state changes).
pub trait ActivityHandler: Send + Sync {
    fn on_playing(&self, payload: Value) -> Result<(), HandlerError>;
}

/// Consumer of `timeline` payloads (library item changes).
pub trait TimelineHandler: Send + Sync {
    fn on_timeline(&self, payload: Value) -> Result<(), HandlerError>;
}

/// Classify one text frame into zero or more events.
///
/// Returns an empty vec for anything that should be dropped: undecodable
/// JSON, a missing or unrecognized `type`, or a recognized type with no
/// payload wrapper.
pub fn classify_frame(text: &str) -> Vec<ActivityEvent> {
    let root: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "dropping undecodable frame");
            return Vec::new();
        }
    };
    let container = root.get("NotificationContainer").unwrap_or(&root);

    let Some(kind) = container.get("type").and_then(Value::as_str) else {
        warn!("dropping frame without a type");
        return Vec::new();
    };

    match kind {
        "playing" => hoist(container, &["PlaySessionStateNotification", "_children"])
            .into_iter()
            .map(ActivityEvent::Playing)
            .collect(),
        "timeline" => hoist(container, &["TimelineEntry", "_children"])
            .into_iter()
            .map(ActivityEvent::Timeline)
            .collect(),
        other => {
            debug!(kind = other, "ignoring frame type");
            Vec::new()
        }
    }
}

/// Pull the payload objects out of the first wrapper key that exists.
fn hoist(container: &Value, keys: &[&str]) -> Vec<Value> {
    for key in keys {
        match container.get(key) {
            Some(Value::Array(items)) => return items.clone(),
            Some(payload) => return vec![payload.clone()],
            None => {}
        }
    }
    warn!(wrapper = keys[0], "dropping frame missing its payload wrapper");
    Vec::new()
}

/// Forward classified events to their handlers. Handler errors are logged
/// and contained per event; a failing handler never takes down the
/// listener.
pub fn dispatch(
    events: Vec<ActivityEvent>,
    activity: &dyn ActivityHandler,
    timeline: &dyn TimelineHandler,
) {
    for event in events {
        let result = match event {
            ActivityEvent::Playing(payload) => activity.on_playing(payload),
            ActivityEvent::Timeline(payload) => timeline.on_timeline(payload),
        };
        if let Err(e) = result {
            warn!(error = %e, "notification handler failed");
        }
    }
}
