// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Recorded activities and their routes.

use crate::error::{AppError, Result};
use crate::models::location::route_line;
use crate::models::{Activity, ActivityId, ActivityType};
use crate::time_utils::{format_clock, format_epoch_millis};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use geojson::{Feature, GeoJson, Geometry, JsonObject};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 200;
/// Google encoded-polyline precision (1e-5 degrees)
const POLYLINE_PRECISION: u32 = 5;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/activities", get(list_activities))
        .route(
            "/api/activities/{id}",
            get(get_activity).delete(delete_activity),
        )
        .route("/api/activities/{id}/route", get(get_route))
        .route("/api/activities/{id}/visibility", put(set_visibility))
        .route("/api/activities/{id}/synced", put(mark_synced))
}

// ─── Listing ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct ListQuery {
    /// Only this activity type
    #[serde(rename = "type")]
    activity_type: Option<String>,
    limit: Option<usize>,
}

#[derive(Serialize)]
pub struct ActivityListResponse {
    pub activities: Vec<Activity>,
    pub total: usize,
}

async fn list_activities(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ActivityListResponse>> {
    let filter = query
        .activity_type
        .as_deref()
        .map(|raw| {
            raw.parse::<ActivityType>()
                .map_err(|e| AppError::BadRequest(e.to_string()))
        })
        .transpose()?;

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_LIMIT
        )));
    }

    let matching: Vec<Activity> = state
        .store
        .list_activities()
        .await?
        .into_iter()
        .filter(|a| filter.map_or(true, |t| a.activity_type == t))
        .collect();
    let total = matching.len();

    Ok(Json(ActivityListResponse {
        activities: matching.into_iter().take(limit).collect(),
        total,
    }))
}

// ─── Detail ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ActivityDetailResponse {
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub id: ActivityId,
    pub activity_type: ActivityType,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub distance_meters: f64,
    pub duration: String,
    pub calories_burned: i32,
    pub avg_pace_seconds_per_km: i32,
    pub step_count: u32,
    pub is_public: bool,
    pub weather_description: Option<String>,
    pub temperature_celsius: Option<f64>,
    pub point_count: usize,
    /// Encoded polyline of the route, absent when there are no points
    pub polyline: Option<String>,
}

async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActivityId>,
) -> Result<Json<ActivityDetailResponse>> {
    let activity = load_activity(&state, id).await?;
    let points = state.store.get_location_points(id).await?;

    let polyline = if points.is_empty() {
        None
    } else {
        Some(
            polyline::encode_coordinates(route_line(&points), POLYLINE_PRECISION)
                .map_err(|e| AppError::Internal(anyhow::anyhow!("polyline encoding: {}", e)))?,
        )
    };

    Ok(Json(ActivityDetailResponse {
        id: activity.id,
        activity_type: activity.activity_type,
        start_date: format_epoch_millis(activity.start_time),
        end_date: activity.end_time.and_then(format_epoch_millis),
        distance_meters: activity.distance_meters,
        duration: format_clock(activity.duration_seconds * 1000),
        calories_burned: activity.calories_burned,
        avg_pace_seconds_per_km: activity.avg_pace_seconds_per_km,
        step_count: activity.step_count,
        is_public: activity.is_public,
        weather_description: activity.weather.as_ref().map(|w| w.description.clone()),
        temperature_celsius: activity.weather.as_ref().map(|w| w.temperature_celsius),
        point_count: points.len(),
        polyline,
    }))
}

/// Route as a GeoJSON LineString feature.
async fn get_route(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActivityId>,
) -> Result<Json<GeoJson>> {
    let activity = load_activity(&state, id).await?;
    let points = state.store.get_location_points(id).await?;

    let mut properties = JsonObject::new();
    properties.insert("activity_id".to_string(), id.into());
    properties.insert(
        "type".to_string(),
        activity.activity_type.as_str().to_string().into(),
    );
    properties.insert("point_count".to_string(), points.len().into());

    let line = route_line(&points);
    let feature = Feature {
        bbox: None,
        geometry: Some(Geometry::new(geojson::Value::from(&line))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    };
    Ok(Json(GeoJson::Feature(feature)))
}

// ─── Mutations ───────────────────────────────────────────────

#[derive(Deserialize)]
struct VisibilityRequest {
    is_public: bool,
}

async fn set_visibility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActivityId>,
    Json(request): Json<VisibilityRequest>,
) -> Result<Json<Activity>> {
    state.store.set_public(id, request.is_public).await?;
    tracing::info!(activity_id = id, is_public = request.is_public, "Visibility changed");
    Ok(Json(load_activity(&state, id).await?))
}

async fn mark_synced(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActivityId>,
) -> Result<Json<Activity>> {
    state.store.mark_synced(id).await?;
    Ok(Json(load_activity(&state, id).await?))
}

async fn delete_activity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<ActivityId>,
) -> Result<StatusCode> {
    if state.tracker.current_activity_id().await? == Some(id) {
        return Err(AppError::BadRequest(
            "Cannot delete the activity being tracked".to_string(),
        ));
    }
    if !state.store.delete_activity(id).await? {
        return Err(AppError::NotFound(format!("Activity {} not found", id)));
    }
    tracing::info!(activity_id = id, "Activity deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn load_activity(state: &AppState, id: ActivityId) -> Result<Activity> {
    state
        .store
        .get_activity(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))
}
