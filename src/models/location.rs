// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! GPS fixes as delivered by the location adapter, and the route points
//! persisted for an activity.

use geo::{Distance, Geodesic, LineString, Point};
use serde::{Deserialize, Serialize};

use crate::models::ActivityId;

/// One raw fix from the platform location service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    /// Instantaneous speed reported by the receiver
    #[serde(default)]
    pub speed_mps: Option<f32>,
    /// Horizontal accuracy radius
    #[serde(default)]
    pub accuracy_meters: Option<f32>,
    /// Capture time (epoch ms)
    pub timestamp_ms: i64,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            speed_mps: None,
            accuracy_meters: None,
            timestamp_ms,
        }
    }

    pub fn with_speed(mut self, speed_mps: f32) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn with_altitude(mut self, altitude: f64) -> Self {
        self.altitude = Some(altitude);
        self
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }

    /// Geodesic (WGS-84) distance in meters.
    pub fn distance_to(&self, other: &LocationFix) -> f64 {
        Geodesic.distance(self.point(), other.point())
    }

    /// Whether the coordinates are on the globe.
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A fix attributed to an activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub activity_id: ActivityId,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
    pub timestamp_ms: i64,
    pub speed_mps: Option<f32>,
}

impl LocationPoint {
    pub fn from_fix(activity_id: ActivityId, fix: &LocationFix) -> Self {
        Self {
            activity_id,
            latitude: fix.latitude,
            longitude: fix.longitude,
            altitude: fix.altitude,
            timestamp_ms: fix.timestamp_ms,
            speed_mps: fix.speed_mps,
        }
    }
}

/// Route polyline (x = longitude, y = latitude) in point order.
pub fn route_line(points: &[LocationPoint]) -> LineString<f64> {
    points
        .iter()
        .map(|p| (p.longitude, p.latitude))
        .collect::<Vec<_>>()
        .into()
}
