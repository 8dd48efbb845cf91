// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Run-Tracker API Server
//!
//! Drives live tracking sessions from pushed device readings and serves
//! the recorded activities.

use run_tracker::{
    config::Config,
    db::MemoryStore,
    models::UserSettings,
    services::OpenMeteoClient,
    tracking::{Collaborators, DeviceBridge, TrackingService},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Run-Tracker API");

    let store = Arc::new(MemoryStore::new(UserSettings::with_weight(
        config.default_weight_kg,
    )));

    let weather = Arc::new(OpenMeteoClient::new(config.weather_base_url.clone())?);
    tracing::info!(base_url = %config.weather_base_url, "Weather client initialized");

    // One bridge serves as both location provider and step counter
    let device = Arc::new(DeviceBridge::default());

    let tracker = TrackingService::new(
        config.tracking.clone(),
        Collaborators {
            store: store.clone(),
            settings: store.clone(),
            weather,
            location: device.clone(),
            steps: device.clone(),
        },
    )
    .spawn();
    tracing::info!("Tracking service started");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        store: store.clone(),
        settings: store,
        tracker,
        device,
    });

    // Build router
    let app = run_tracker::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("run_tracker=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
