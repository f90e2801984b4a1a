//! Per-die canvas state.

use serde::{Deserialize, Serialize};

use dicebox_roll::Vec3;

/// Where a die is in its on-canvas lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiceLifecycle {
    /// Just placed, not yet thrown.
    Spawning,
    /// In motion.
    Throwing,
    /// At rest with a final value.
    Settled,
    /// Settled and visually emphasized.
    Highlighted,
}

/// The canvas-side record of one active die.
///
/// Created on spawn, mutated in place through its lifecycle, and removed
/// on explicit removal, disconnection cleanup, or TTL expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasDiceState {
    /// Opaque id, unique within the room.
    pub id: String,
    /// Die-type label, e.g. `"d6"`.
    pub dice_type: String,
    /// Current position on the canvas.
    pub position: Vec3,
    /// Current velocity while throwing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub velocity: Option<Vec3>,
    /// Whether this entry is a virtual proxy.
    pub is_virtual: bool,
    /// Aggregated sub-rolls carried by a virtual proxy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_rolls: Option<Vec<u32>>,
    /// The user who spawned (and owns) this die.
    pub user_id: String,
    /// Spawn time, milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Lifecycle stage.
    pub state: DiceLifecycle,
    /// Final value once settled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_serializes_with_camel_case_keys() {
        let die = CanvasDiceState {
            id: "d-1".to_string(),
            dice_type: "d20".to_string(),
            position: Vec3::new(0.0, 0.0, 1.5),
            velocity: None,
            is_virtual: false,
            virtual_rolls: None,
            user_id: "alice".to_string(),
            timestamp: 42,
            state: DiceLifecycle::Spawning,
            result: None,
        };
        let json = serde_json::to_value(&die).unwrap();
        assert_eq!(json["diceType"], "d20");
        assert_eq!(json["userId"], "alice");
        assert_eq!(json["state"], "spawning");
        assert!(json.get("velocity").is_none());
        assert!(json.get("result").is_none());
    }
}
