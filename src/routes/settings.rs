// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User settings.

use crate::error::{AppError, Result};
use crate::models::UserSettings;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

/// Plausible body weight range (kg)
const MIN_WEIGHT_KG: f64 = 20.0;
const MAX_WEIGHT_KG: f64 = 400.0;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/settings", get(get_settings).put(update_settings))
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Result<Json<UserSettings>> {
    Ok(Json(state.settings.get_settings().await?))
}

/// Replace the settings. A live session keeps the weight it started with.
async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(settings): Json<UserSettings>,
) -> Result<Json<UserSettings>> {
    if !(MIN_WEIGHT_KG..=MAX_WEIGHT_KG).contains(&settings.weight_kg) {
        return Err(AppError::BadRequest(format!(
            "weight_kg must be between {} and {}",
            MIN_WEIGHT_KG, MAX_WEIGHT_KG
        )));
    }

    state.settings.update_settings(&settings).await?;
    tracing::info!(
        weight_kg = settings.weight_kg,
        preferred_activity_type = %settings.preferred_activity_type,
        "Settings updated"
    );
    Ok(Json(settings))
}
