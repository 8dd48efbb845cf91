// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Workout activity model for storage and API.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::WeatherData;

/// Storage-assigned activity identifier.
pub type ActivityId = i64;

/// Kind of workout being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum ActivityType {
    #[default]
    Running,
    Walking,
    Cycling,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [
        ActivityType::Running,
        ActivityType::Walking,
        ActivityType::Cycling,
    ];

    /// Metabolic equivalent used for calorie estimates.
    pub fn met_value(self) -> f64 {
        match self {
            ActivityType::Running => 10.0,
            ActivityType::Walking => 3.5,
            ActivityType::Cycling => 7.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Running => "running",
            ActivityType::Walking => "walking",
            ActivityType::Cycling => "cycling",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ActivityType::Running => "Running",
            ActivityType::Walking => "Walking",
            ActivityType::Cycling => "Cycling",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown activity type: {0}")]
pub struct ParseActivityTypeError(pub String);

impl FromStr for ActivityType {
    type Err = ParseActivityTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseActivityTypeError(s.to_string()))
    }
}

/// Calories for `elapsed_ms` of activity: MET × kg × hours, rounded.
pub fn calories_burned(activity_type: ActivityType, weight_kg: f64, elapsed_ms: i64) -> i32 {
    let hours = elapsed_ms.max(0) as f64 / 3_600_000.0;
    (activity_type.met_value() * weight_kg * hours).round() as i32
}

/// Average pace in seconds per kilometre; zero when no distance was covered.
pub fn average_pace_seconds_per_km(duration_ms: i64, distance_meters: f64) -> i32 {
    if distance_meters > 0.0 {
        ((duration_ms as f64 / 1000.0) / (distance_meters / 1000.0)).round() as i32
    } else {
        0
    }
}

/// Stored activity record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    /// Storage-assigned id
    pub id: ActivityId,
    /// Running, walking or cycling
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Start time (epoch ms)
    pub start_time: i64,
    /// End time (epoch ms); `None` while the session is live
    pub end_time: Option<i64>,
    /// Distance in meters
    pub distance_meters: f64,
    /// Moving time in seconds (pauses excluded)
    pub duration_seconds: i64,
    pub calories_burned: i32,
    pub avg_pace_seconds_per_km: i32,
    pub step_count: u32,
    /// Whether the cloud backup has this version
    pub is_synced: bool,
    /// Whether the activity appears on the social feed
    pub is_public: bool,
    /// Conditions captured near the start of the session
    pub weather: Option<WeatherData>,
}

impl Activity {
    /// A freshly started activity with no stats yet.
    pub fn draft(id: ActivityId, activity_type: ActivityType, start_time: i64) -> Self {
        Self {
            id,
            activity_type,
            start_time,
            end_time: None,
            distance_meters: 0.0,
            duration_seconds: 0,
            calories_burned: 0,
            avg_pace_seconds_per_km: 0,
            step_count: 0,
            is_synced: false,
            is_public: false,
            weather: None,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.end_time.is_some()
    }

    /// Write the end-of-session stats onto this record.
    ///
    /// Clears `is_synced`: the backed-up copy is now stale.
    pub fn apply_summary(&mut self, summary: &ActivitySummary) {
        self.end_time = Some(summary.end_time);
        self.distance_meters = summary.distance_meters;
        self.duration_seconds = summary.duration_seconds;
        self.calories_burned = summary.calories_burned;
        self.avg_pace_seconds_per_km = summary.avg_pace_seconds_per_km;
        self.step_count = summary.step_count;
        self.weather = summary.weather.clone();
        self.is_synced = false;
    }
}

/// Final statistics written when a session stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    pub end_time: i64,
    pub distance_meters: f64,
    pub duration_seconds: i64,
    pub calories_burned: i32,
    pub avg_pace_seconds_per_km: i32,
    pub step_count: u32,
    pub weather: Option<WeatherData>,
}
