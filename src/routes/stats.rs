// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Aggregate statistics over a time window.

use crate::error::{AppError, Result};
use crate::models::ActivityStats;
use crate::time_utils::parse_rfc3339_millis;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/stats", get(get_stats))
}

#[derive(Deserialize)]
struct StatsQuery {
    /// Window start (RFC3339, inclusive); unbounded if absent
    from: Option<String>,
    /// Window end (RFC3339, exclusive); unbounded if absent
    to: Option<String>,
}

async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ActivityStats>> {
    let from = parse_bound("from", query.from.as_deref())?.unwrap_or(i64::MIN);
    let to = parse_bound("to", query.to.as_deref())?.unwrap_or(i64::MAX);
    if from >= to {
        return Err(AppError::BadRequest("from must be before to".to_string()));
    }

    let activities = state.store.list_activities().await?;
    Ok(Json(ActivityStats::for_window(&activities, from, to)))
}

fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<i64>> {
    value
        .map(|raw| {
            parse_rfc3339_millis(raw).ok_or_else(|| {
                AppError::BadRequest(format!("Invalid {} date (expected RFC3339)", name))
            })
        })
        .transpose()
}
