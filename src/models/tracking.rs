//! Live session snapshot shared with observers.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::ActivityType;
use crate::time_utils::format_clock;

/// Point-in-time view of the live session. Replaced wholesale on every
/// update; never patched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct TrackingState {
    pub activity_type: ActivityType,
    pub is_tracking: bool,
    pub is_paused: bool,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub duration_millis: i64,
    pub distance_meters: f64,
    pub current_speed_mps: f32,
    /// Seconds per km, refreshed by the timer
    pub avg_pace_seconds_per_km: f64,
    pub steps: u32,
    pub calories: i32,
}

impl TrackingState {
    /// One-line summary, e.g. `Tracking Running · 12:05 · 1.23 km`.
    pub fn status_line(&self) -> String {
        if !self.is_tracking {
            return "Not tracking".to_string();
        }
        let verb = if self.is_paused { "Paused" } else { "Tracking" };
        format!(
            "{} {} · {} · {:.2} km",
            verb,
            self.activity_type,
            format_clock(self.duration_millis),
            self.distance_meters / 1000.0
        )
    }
}
