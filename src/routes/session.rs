// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live session control and status.

use crate::error::Result;
use crate::models::{ActivityId, ActivityType, TrackingState};
use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", get(get_session))
        .route("/api/session/events", get(session_events))
        .route("/api/session/start", post(start_session))
        .route("/api/session/pause", post(pause_session))
        .route("/api/session/resume", post(resume_session))
        .route("/api/session/stop", post(stop_session))
}

/// Current session status.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct SessionResponse {
    pub state: TrackingState,
    pub status_line: String,
    /// Set once the draft activity exists
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub activity_id: Option<ActivityId>,
}

async fn get_session(State(state): State<Arc<AppState>>) -> Result<Json<SessionResponse>> {
    let activity_id = state.tracker.current_activity_id().await?;
    let current = state.tracker.status().current();
    Ok(Json(SessionResponse {
        status_line: current.status_line(),
        state: current,
        activity_id,
    }))
}

/// Server-sent stream of the latest session state.
async fn session_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let stream = state.tracker.status().updates().map(|tracking| {
        let event = Event::default()
            .event("tracking")
            .json_data(&tracking)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to encode tracking event");
                Event::default().comment("encode error")
            });
        Ok(event)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    /// Falls back to the preferred type in settings
    #[serde(default)]
    pub activity_type: Option<ActivityType>,
}

/// Result of a start/pause/resume call.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ControlResponse {
    /// `false` when the call was a no-op in the current state
    pub changed: bool,
    pub state: TrackingState,
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<ControlResponse>> {
    let activity_type = match request.activity_type {
        Some(t) => t,
        None => state.settings.get_settings().await?.preferred_activity_type,
    };
    let changed = state.tracker.start(activity_type).await?;
    Ok(control_response(&state, changed))
}

async fn pause_session(State(state): State<Arc<AppState>>) -> Result<Json<ControlResponse>> {
    let changed = state.tracker.pause().await?;
    Ok(control_response(&state, changed))
}

async fn resume_session(State(state): State<Arc<AppState>>) -> Result<Json<ControlResponse>> {
    let changed = state.tracker.resume().await?;
    Ok(control_response(&state, changed))
}

fn control_response(state: &AppState, changed: bool) -> Json<ControlResponse> {
    Json(ControlResponse {
        changed,
        state: state.tracker.status().current(),
    })
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct StopResponse {
    /// `null` when no session was active
    #[cfg_attr(feature = "binding-generation", ts(type = "number | null"))]
    pub activity_id: Option<ActivityId>,
}

async fn stop_session(State(state): State<Arc<AppState>>) -> Result<Json<StopResponse>> {
    let activity_id = state.tracker.stop().await?;
    if let Some(id) = activity_id {
        tracing::info!(activity_id = id, "Workout saved");
    }
    Ok(Json(StopResponse { activity_id }))
}
