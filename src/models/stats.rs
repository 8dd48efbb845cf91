//! Activity statistics aggregates for the stats dashboard.
//!
//! Built from finished activities whose start time falls in a window
//! (day, week, month or an arbitrary range).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::{Activity, ActivityId};

/// Aggregated totals over a set of activities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityStats {
    // ─── Totals ──────────────────────────────────────────────────
    /// Finished activities counted
    #[serde(default)]
    pub total_activities: u32,
    /// Total distance (meters)
    #[serde(default)]
    pub total_distance_meters: f64,
    /// Total moving time (seconds)
    #[serde(default)]
    pub total_duration_seconds: i64,
    #[serde(default)]
    pub total_calories: i64,
    #[serde(default)]
    pub total_steps: u64,

    // ─── By Activity Type ────────────────────────────────────────
    /// Activity count per type (for pie charts)
    #[serde(default)]
    pub activities_by_type: HashMap<String, u32>,
    /// Total distance per type (meters)
    #[serde(default)]
    pub distance_by_type: HashMap<String, f64>,

    // ─── Time Series ─────────────────────────────────────────────
    /// Activity count per day ("YYYY-MM-DD", UTC)
    #[serde(default)]
    pub activities_by_day: HashMap<String, u32>,

    // ─── Idempotency ─────────────────────────────────────────────
    #[serde(skip)]
    counted_ids: HashSet<ActivityId>,
}

impl ActivityStats {
    /// Aggregate finished activities starting in `[from, to)` (epoch ms).
    pub fn for_window<'a>(
        activities: impl IntoIterator<Item = &'a Activity>,
        from: i64,
        to: i64,
    ) -> Self {
        let mut stats = Self::default();
        for activity in activities {
            if (from..to).contains(&activity.start_time) {
                stats.update_from_activity(activity);
            }
        }
        stats
    }

    /// Add one activity to the totals.
    ///
    /// Returns `false` (and changes nothing) for unfinished activities and
    /// ids already counted.
    pub fn update_from_activity(&mut self, activity: &Activity) -> bool {
        if !activity.is_finished() || self.counted_ids.contains(&activity.id) {
            return false;
        }
        self.counted_ids.insert(activity.id);

        self.total_activities += 1;
        self.total_distance_meters += activity.distance_meters;
        self.total_duration_seconds += activity.duration_seconds;
        self.total_calories += i64::from(activity.calories_burned);
        self.total_steps += u64::from(activity.step_count);

        let type_key = activity.activity_type.as_str().to_string();
        *self
            .activities_by_type
            .entry(type_key.clone())
            .or_insert(0) += 1;
        *self.distance_by_type.entry(type_key).or_insert(0.0) += activity.distance_meters;

        if let Some(day_key) = day_key(activity.start_time) {
            *self.activities_by_day.entry(day_key).or_insert(0) += 1;
        }

        true
    }
}

/// "YYYY-MM-DD" for an epoch-ms timestamp.
fn day_key(millis: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(millis).map(|d| d.format("%Y-%m-%d").to_string())
}
