// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Run-Tracker: live GPS workout tracking
//!
//! This crate records running, walking and cycling sessions from location
//! and step-counter events, keeps live statistics, and commits each workout
//! with its ordered route once tracking stops.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;
pub mod tracking;

use std::sync::Arc;

use config::Config;
use db::{ActivityStore, SettingsStore};
use tracking::{DeviceBridge, TrackingHandle};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ActivityStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub tracker: TrackingHandle,
    pub device: Arc<DeviceBridge>,
}
