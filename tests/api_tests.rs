// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP surface: session control, device input and activity reads.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use run_tracker::db::ActivityStore;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

fn location(lat: f64, lon: f64, timestamp_ms: i64) -> Value {
    json!({ "latitude": lat, "longitude": lon, "timestamp_ms": timestamp_ms })
}

#[tokio::test]
async fn test_health() {
    let (app, _state) = common::create_test_app();
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["tracking"], false);
}

#[tokio::test]
async fn test_full_session_over_http() {
    let (app, _state) = common::create_test_app();

    let (status, body) = send(
        &app,
        "POST",
        "/api/session/start",
        Some(json!({ "activity_type": "cycling" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["changed"], true);
    assert_eq!(body["state"]["is_tracking"], true);
    assert_eq!(body["state"]["activity_type"], "cycling");

    for (i, lat) in [37.4000, 37.4010, 37.4020].iter().enumerate() {
        let (status, body) = send(
            &app,
            "POST",
            "/api/device/location",
            Some(location(*lat, -122.1, 1_700_000_000_000 + i as i64 * 3000)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], true);
    }
    let (_, body) = send(
        &app,
        "POST",
        "/api/device/steps",
        Some(json!({ "total_steps": 100 })),
    )
    .await;
    assert_eq!(body["accepted"], true);

    let (status, body) = send(&app, "GET", "/api/session", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["status_line"]
        .as_str()
        .unwrap()
        .starts_with("Tracking Cycling"));

    let (status, body) = send(&app, "POST", "/api/session/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    let id = body["activity_id"].as_i64().expect("saved activity id");

    let (status, body) = send(&app, "GET", &format!("/api/activities/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activity_type"], "cycling");
    assert_eq!(body["point_count"], 3);
    assert!(body["polyline"].as_str().is_some());
    assert!(body["distance_meters"].as_f64().unwrap() > 200.0);

    let (status, body) = send(&app, "GET", &format!("/api/activities/{}/route", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "Feature");
    assert_eq!(body["geometry"]["type"], "LineString");
    let coordinates = body["geometry"]["coordinates"].as_array().unwrap();
    assert_eq!(coordinates.len(), 3);
    // GeoJSON order is [lon, lat]
    assert_eq!(coordinates[0][0], -122.1);
    assert_eq!(coordinates[0][1], 37.4);
}

#[tokio::test]
async fn test_stop_without_session_returns_null_id() {
    let (app, _state) = common::create_test_app();
    let (status, body) = send(&app, "POST", "/api/session/stop", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["activity_id"], Value::Null);
}

#[tokio::test]
async fn test_start_uses_preferred_type_from_settings() {
    let (app, _state) = common::create_test_app();

    let (status, _) = send(
        &app,
        "PUT",
        "/api/settings",
        Some(json!({
            "preferred_activity_type": "walking",
            "use_metric_units": true,
            "notifications_enabled": false,
            "weight_kg": 65.0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, "POST", "/api/session/start", Some(json!({}))).await;
    assert_eq!(body["state"]["activity_type"], "walking");

    let (_, body) = send(&app, "POST", "/api/session/start", Some(json!({}))).await;
    assert_eq!(body["changed"], false);
}

#[tokio::test]
async fn test_pause_and_resume_over_http() {
    let (app, _state) = common::create_test_app();
    send(&app, "POST", "/api/session/start", Some(json!({}))).await;

    let (_, body) = send(&app, "POST", "/api/session/pause", None).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["state"]["is_paused"], true);

    let (_, body) = send(&app, "POST", "/api/session/pause", None).await;
    assert_eq!(body["changed"], false);

    let (_, body) = send(&app, "POST", "/api/session/resume", None).await;
    assert_eq!(body["changed"], true);
    assert_eq!(body["state"]["is_paused"], false);
}

#[tokio::test]
async fn test_out_of_range_coordinates_rejected() {
    let (app, _state) = common::create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/device/location",
        Some(location(120.0, 0.0, 0)),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_device_input_without_session_is_not_accepted() {
    let (app, _state) = common::create_test_app();
    let (status, body) = send(
        &app,
        "POST",
        "/api/device/location",
        Some(location(37.4, -122.1, 0)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["accepted"], false);
}

#[tokio::test]
async fn test_invalid_weight_rejected() {
    let (app, _state) = common::create_test_app();
    let (status, _) = send(
        &app,
        "PUT",
        "/api/settings",
        Some(json!({ "weight_kg": -3.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = send(&app, "GET", "/api/settings", None).await;
    assert_eq!(body["weight_kg"], 70.0);
}

#[tokio::test]
async fn test_activity_management() {
    let (app, _state) = common::create_test_app();
    send(&app, "POST", "/api/session/start", Some(json!({}))).await;
    let (_, body) = send(&app, "POST", "/api/session/stop", None).await;
    let id = body["activity_id"].as_i64().unwrap();

    let (status, body) = send(
        &app,
        "PUT",
        &format!("/api/activities/{}/visibility", id),
        Some(json!({ "is_public": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_public"], true);

    let (_, body) = send(&app, "PUT", &format!("/api/activities/{}/synced", id), None).await;
    assert_eq!(body["is_synced"], true);

    let (_, body) = send(&app, "GET", "/api/activities?type=running", None).await;
    assert_eq!(body["total"], 1);
    let (_, body) = send(&app, "GET", "/api/activities?type=cycling", None).await;
    assert_eq!(body["total"], 0);

    let (status, _) = send(&app, "DELETE", &format!("/api/activities/{}", id), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, "GET", &format!("/api/activities/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_activity_list_validation() {
    let (app, _state) = common::create_test_app();
    let (status, _) = send(&app, "GET", "/api/activities?type=swimming", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = send(&app, "GET", "/api/activities?limit=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stats_window() {
    let (app, state) = common::create_test_app();
    send(&app, "POST", "/api/session/start", Some(json!({}))).await;
    let (_, body) = send(&app, "POST", "/api/session/stop", None).await;
    assert!(body["activity_id"].is_i64());
    assert_eq!(state.store.list_activities().await.unwrap().len(), 1);

    // The test clock starts at 2023-11-14T22:13:20Z
    let (status, body) = send(
        &app,
        "GET",
        "/api/stats?from=2023-11-14T00:00:00Z&to=2023-11-15T00:00:00Z",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_activities"], 1);
    assert_eq!(body["activities_by_type"]["running"], 1);

    let (_, body) = send(&app, "GET", "/api/stats?from=2024-01-01T00:00:00Z", None).await;
    assert_eq!(body["total_activities"], 0);

    let (status, _) = send(&app, "GET", "/api/stats?from=yesterday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
