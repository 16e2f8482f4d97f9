use serde::{Deserialize, Serialize};

use crate::math::FRACTION_TOLERANCE;

/// Tunables shared by every rule held in a [`RuleStore`](crate::model::RuleStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Tolerance used when checking that fractions and probabilities sum to one.
    pub tolerance: f64,
    /// Deepest level a cubic polygon may sit at (the root is level 0).
    pub max_cubic_level: u32,
    /// Rescale fractions proportionally instead of resetting them to a uniform split.
    pub proportional_fractions: bool,
    /// Number of background field slots given to new non-cubic and cubic rules.
    pub min_background_fields: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: FRACTION_TOLERANCE,
            max_cubic_level: 3,
            proportional_fractions: false,
            min_background_fields: 2,
        }
    }
}
