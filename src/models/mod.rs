// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod location;
pub mod settings;
pub mod stats;
pub mod tracking;
pub mod weather;

pub use activity::{Activity, ActivityId, ActivitySummary, ActivityType};
pub use location::{LocationFix, LocationPoint};
pub use settings::UserSettings;
pub use stats::ActivityStats;
pub use tracking::TrackingState;
pub use weather::WeatherData;
