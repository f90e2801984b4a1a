//! Wire-level shapes handed to the rendering and transport collaborators.
//!
//! These types are the serialization contract crossing the subsystem
//! boundary; field names follow the transport layer's camelCase
//! convention.

use serde::{Deserialize, Serialize};

/// A spawn position or velocity in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component (vertical).
    pub z: f32,
}

impl Vec3 {
    /// Construct from components.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Vec3 { x, y, z }
    }
}

/// One die (or virtual proxy) as handed to the canvas/transport boundary.
///
/// When `is_virtual` is true, `virtual_rolls` holds every aggregated
/// sub-roll and `result` is their sum; `position` is a spawn hint only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiceRollDescriptor {
    /// Opaque id for the canvas entity representing this die.
    pub canvas_id: String,
    /// Die-type label, e.g. `"d6"`; non-standard sides keep the same
    /// `d{sides}` form.
    pub dice_type: String,
    /// Spawn position hint.
    pub position: Vec3,
    /// Whether this entry is a statistically sampled proxy rather than a
    /// physically simulated die.
    pub is_virtual: bool,
    /// Aggregated sub-rolls carried by a virtual proxy. May be empty for
    /// the trailing proxy of a cluster whose chunking divides unevenly;
    /// consumers must tolerate an empty list with a zero `result`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_rolls: Option<Vec<u32>>,
    /// This entry's value: the individual roll, or the proxy's sum.
    pub result: u32,
}

/// Everything the canvas layer needs to display one processed roll.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasData {
    /// One entry per physical die or virtual proxy.
    pub dice_rolls: Vec<DiceRollDescriptor>,
}

/// The complete outcome of processing a dice expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollResult {
    /// Every individual outcome, in generation order.
    pub rolls: Vec<u32>,
    /// Sum of `rolls`.
    pub result: u32,
    /// Canonicalized expression, or `"invalid"`.
    pub interpreted_expression: String,
    /// Display payload for the canvas layer.
    pub canvas_data: CanvasData,
}

impl RollResult {
    /// The zero-result placeholder returned for malformed expressions,
    /// so command pipelines never crash on user input.
    pub fn invalid() -> Self {
        RollResult {
            rolls: Vec::new(),
            result: 0,
            interpreted_expression: "invalid".to_string(),
            canvas_data: CanvasData {
                dice_rolls: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_serializes_with_camel_case_keys() {
        let descriptor = DiceRollDescriptor {
            canvas_id: "c-1".to_string(),
            dice_type: "d6".to_string(),
            position: Vec3::new(0.0, 0.0, 1.5),
            is_virtual: false,
            virtual_rolls: None,
            result: 4,
        };
        let json = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(json["canvasId"], "c-1");
        assert_eq!(json["diceType"], "d6");
        assert_eq!(json["isVirtual"], false);
        assert_eq!(json["result"], 4);
        // Absent for physical dice, not null.
        assert!(json.get("virtualRolls").is_none());
    }

    #[test]
    fn invalid_placeholder_is_empty_and_zero() {
        let placeholder = RollResult::invalid();
        assert!(placeholder.rolls.is_empty());
        assert_eq!(placeholder.result, 0);
        assert_eq!(placeholder.interpreted_expression, "invalid");
        assert!(placeholder.canvas_data.dice_rolls.is_empty());
    }
}
