// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device readings pushed in by the phone or watch.

use crate::error::{AppError, Result};
use crate::models::LocationFix;
use crate::AppState;
use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/device/location", post(push_location))
        .route("/api/device/location/error", post(push_location_error))
        .route("/api/device/steps", post(push_steps))
}

#[derive(Debug, Deserialize)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub speed_mps: Option<f32>,
    #[serde(default)]
    pub accuracy_meters: Option<f32>,
    /// Capture time (epoch ms); defaults to receipt time
    #[serde(default)]
    pub timestamp_ms: Option<i64>,
}

impl LocationRequest {
    fn into_fix(self) -> Result<LocationFix> {
        let fix = LocationFix {
            latitude: self.latitude,
            longitude: self.longitude,
            altitude: self.altitude,
            speed_mps: self.speed_mps,
            accuracy_meters: self.accuracy_meters,
            timestamp_ms: self
                .timestamp_ms
                .unwrap_or_else(|| chrono::Utc::now().timestamp_millis()),
        };
        if !fix.has_valid_coordinates() {
            return Err(AppError::BadRequest(format!(
                "Coordinates out of range: {}, {}",
                fix.latitude, fix.longitude
            )));
        }
        Ok(fix)
    }
}

#[derive(Debug, Deserialize)]
pub struct StepsRequest {
    /// Cumulative device step counter
    pub total_steps: u64,
}

#[derive(Debug, Deserialize)]
pub struct LocationErrorRequest {
    pub message: String,
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PushResponse {
    /// `false` when no session is listening and the reading was dropped
    pub accepted: bool,
}

async fn push_location(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LocationRequest>,
) -> Result<Json<PushResponse>> {
    let fix = request.into_fix()?;
    let accepted = state.device.push_location(fix);
    Ok(Json(PushResponse { accepted }))
}

async fn push_location_error(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LocationErrorRequest>,
) -> Json<PushResponse> {
    let accepted = state.device.report_location_error(request.message);
    Json(PushResponse { accepted })
}

async fn push_steps(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StepsRequest>,
) -> Json<PushResponse> {
    let accepted = state.device.push_steps(request.total_steps);
    Json(PushResponse { accepted })
}
