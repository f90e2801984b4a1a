//! Thresholds steering the physical-versus-virtual decision.

use serde::{Deserialize, Serialize};

use dicebox_geometry::DieKind;

/// Configuration for roll processing.
///
/// Every threshold the virtualization policy consults lives here; none
/// is baked into decision code. All fields are settable at construction
/// and at runtime through [`RollConfig::update`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollConfig {
    /// Most dice that may be simulated as individual rigid bodies.
    pub max_physical_dice: u32,
    /// Hard cap on dice per roll; larger counts are clamped at parse.
    pub max_total_dice: u32,
    /// Die-type labels that have physical geometry, e.g. `"d6"`.
    pub supported_dice_types: Vec<String>,
    /// Complexity (count x sides) above which a roll goes virtual.
    pub virtual_dice_threshold: u32,
    /// Die count at which a roll is "massive" and always a single proxy.
    pub massive_roll_threshold: u32,
    /// Side count above which a die type is treated as non-standard.
    pub non_standard_dice_threshold: u32,
    /// Second complexity ceiling for the virtualization decision.
    pub complexity_threshold: u32,
    /// Allow splitting virtual rolls across a cluster of proxies.
    pub enable_smart_clustering: bool,
    /// Proxy count ceiling for one die type when clustering.
    pub max_physical_dice_per_type: u32,
}

impl Default for RollConfig {
    fn default() -> Self {
        RollConfig {
            max_physical_dice: 10,
            max_total_dice: 10_000,
            supported_dice_types: DieKind::ALL.iter().map(|k| k.label().to_string()).collect(),
            virtual_dice_threshold: 200,
            massive_roll_threshold: 100,
            non_standard_dice_threshold: 100,
            complexity_threshold: 500,
            enable_smart_clustering: true,
            max_physical_dice_per_type: 5,
        }
    }
}

impl RollConfig {
    /// Merge a partial update into this configuration.
    pub fn update(&mut self, patch: RollConfigUpdate) {
        if let Some(v) = patch.max_physical_dice {
            self.max_physical_dice = v;
        }
        if let Some(v) = patch.max_total_dice {
            self.max_total_dice = v;
        }
        if let Some(v) = patch.supported_dice_types {
            self.supported_dice_types = v;
        }
        if let Some(v) = patch.virtual_dice_threshold {
            self.virtual_dice_threshold = v;
        }
        if let Some(v) = patch.massive_roll_threshold {
            self.massive_roll_threshold = v;
        }
        if let Some(v) = patch.non_standard_dice_threshold {
            self.non_standard_dice_threshold = v;
        }
        if let Some(v) = patch.complexity_threshold {
            self.complexity_threshold = v;
        }
        if let Some(v) = patch.enable_smart_clustering {
            self.enable_smart_clustering = v;
        }
        if let Some(v) = patch.max_physical_dice_per_type {
            self.max_physical_dice_per_type = v;
        }
    }

    /// Whether `label` (e.g. `"d6"`) names a supported physical die type.
    pub fn supports(&self, label: &str) -> bool {
        self.supported_dice_types.iter().any(|t| t == label)
    }
}

/// Partial [`RollConfig`] for runtime merges; `None` fields keep their
/// current value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RollConfigUpdate {
    /// See [`RollConfig::max_physical_dice`].
    pub max_physical_dice: Option<u32>,
    /// See [`RollConfig::max_total_dice`].
    pub max_total_dice: Option<u32>,
    /// See [`RollConfig::supported_dice_types`].
    pub supported_dice_types: Option<Vec<String>>,
    /// See [`RollConfig::virtual_dice_threshold`].
    pub virtual_dice_threshold: Option<u32>,
    /// See [`RollConfig::massive_roll_threshold`].
    pub massive_roll_threshold: Option<u32>,
    /// See [`RollConfig::non_standard_dice_threshold`].
    pub non_standard_dice_threshold: Option<u32>,
    /// See [`RollConfig::complexity_threshold`].
    pub complexity_threshold: Option<u32>,
    /// See [`RollConfig::enable_smart_clustering`].
    pub enable_smart_clustering: Option<bool>,
    /// See [`RollConfig::max_physical_dice_per_type`].
    pub max_physical_dice_per_type: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_merges_only_set_fields() {
        let mut config = RollConfig::default();
        let before = config.clone();
        config.update(RollConfigUpdate {
            max_physical_dice: Some(3),
            enable_smart_clustering: Some(false),
            ..Default::default()
        });
        assert_eq!(config.max_physical_dice, 3);
        assert!(!config.enable_smart_clustering);
        assert_eq!(config.max_total_dice, before.max_total_dice);
        assert_eq!(config.supported_dice_types, before.supported_dice_types);
    }

    #[test]
    fn default_supports_the_standard_kinds() {
        let config = RollConfig::default();
        for label in ["d4", "d6", "d8", "d10", "d12", "d20"] {
            assert!(config.supports(label));
        }
        assert!(!config.supports("d37"));
    }
}
