//! User preferences.

use serde::{Deserialize, Serialize};

use crate::models::ActivityType;

/// Single-row user settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub preferred_activity_type: ActivityType,
    #[serde(default = "default_true")]
    pub use_metric_units: bool,
    #[serde(default = "default_true")]
    pub notifications_enabled: bool,
    /// Body weight for calorie estimates
    pub weight_kg: f64,
}

fn default_true() -> bool {
    true
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::with_weight(70.0)
    }
}

impl UserSettings {
    pub fn with_weight(weight_kg: f64) -> Self {
        Self {
            preferred_activity_type: ActivityType::Running,
            use_metric_units: true,
            notifications_enabled: true,
            weight_kg,
        }
    }
}
