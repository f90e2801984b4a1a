//! Lifecycle events broadcast to canvas subscribers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to a die (or the whole canvas).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanvasEventType {
    /// A die appeared on the canvas.
    Spawn,
    /// A die was given throw velocity.
    Throw,
    /// A die came to rest with a final value.
    Settle,
    /// A die was visually highlighted.
    Highlight,
    /// A die was removed.
    Remove,
    /// The whole room's canvas was cleared.
    Clear,
}

/// One append-only record on a room's event stream.
///
/// Events are never mutated after creation; subscribers and late joiners
/// replaying [`events_for_room`](crate::CanvasStateManager::events_for_room)
/// see the same immutable history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasEvent {
    /// Unique event id.
    pub id: String,
    /// What happened.
    pub event_type: CanvasEventType,
    /// The die this event concerns; absent for canvas-wide events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dice_id: Option<String>,
    /// The user whose action produced the event.
    pub user_id: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Event-specific payload (final value, positions, removal counts).
    pub data: serde_json::Value,
}

impl CanvasEvent {
    pub(crate) fn new(
        event_type: CanvasEventType,
        dice_id: Option<String>,
        user_id: &str,
        timestamp: u64,
        data: serde_json::Value,
    ) -> Self {
        CanvasEvent {
            id: Uuid::new_v4().to_string(),
            event_type,
            dice_id,
            user_id: user_id.to_string(),
            timestamp,
            data,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_serializes_lowercase() {
        let json = serde_json::to_value(CanvasEventType::Highlight).unwrap();
        assert_eq!(json, "highlight");
    }

    #[test]
    fn canvas_wide_events_omit_dice_id() {
        let event = CanvasEvent::new(
            CanvasEventType::Clear,
            None,
            "alice",
            1_000,
            serde_json::json!({ "removed": 3 }),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert!(json.get("diceId").is_none());
        assert_eq!(json["eventType"], "clear");
        assert_eq!(json["userId"], "alice");
    }
}
