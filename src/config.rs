//! Application configuration loaded from environment variables.
//!
//! Tracking tunables default to the values the mobile client uses
//! (3 s location interval, 5 m movement threshold, 1 s timer tick).

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// Server port
    pub port: u16,
    /// Open-Meteo API base URL (no trailing slash)
    pub weather_base_url: String,
    /// Body weight seeded into settings on first start
    pub default_weight_kg: f64,
    /// Live session tunables
    pub tracking: TrackingConfig,
}

/// Tunables for a live tracking session.
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Requested interval between location fixes
    pub location_interval: Duration,
    /// Fastest interval the location adapter may deliver at
    pub fastest_location_interval: Duration,
    /// Consecutive-fix distance must exceed this to count (jitter filter)
    pub min_movement_meters: f64,
    /// Period of the elapsed-time timer
    pub timer_interval: Duration,
    /// Upper bound on waiting for the draft activity id
    pub activity_id_timeout: Duration,
    /// Attempts per location-point batch before it is re-queued
    pub point_write_attempts: u32,
    /// Weight used for calorie math until settings are read
    pub fallback_weight_kg: f64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            location_interval: Duration::from_millis(3000),
            fastest_location_interval: Duration::from_millis(2000),
            min_movement_meters: 5.0,
            timer_interval: Duration::from_millis(1000),
            activity_id_timeout: Duration::from_millis(5000),
            point_write_attempts: 3,
            fallback_weight_kg: 70.0,
        }
    }
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            port: 8080,
            weather_base_url: "https://api.open-meteo.com/v1".to_string(),
            default_weight_kg: 70.0,
            tracking: TrackingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let defaults = TrackingConfig::default();
        let default_weight_kg = parse_var("DEFAULT_WEIGHT_KG", 70.0)?;

        let tracking = TrackingConfig {
            location_interval: parse_millis("LOCATION_INTERVAL_MS", defaults.location_interval)?,
            fastest_location_interval: parse_millis(
                "FASTEST_LOCATION_INTERVAL_MS",
                defaults.fastest_location_interval,
            )?,
            min_movement_meters: parse_var("MIN_MOVEMENT_METERS", defaults.min_movement_meters)?,
            timer_interval: parse_millis("TIMER_INTERVAL_MS", defaults.timer_interval)?,
            activity_id_timeout: parse_millis(
                "ACTIVITY_ID_TIMEOUT_MS",
                defaults.activity_id_timeout,
            )?,
            point_write_attempts: parse_var("POINT_WRITE_ATTEMPTS", defaults.point_write_attempts)?
                .max(1),
            fallback_weight_kg: default_weight_kg,
        };

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            port: parse_var("PORT", 8080)?,
            weather_base_url: env::var("WEATHER_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://api.open-meteo.com/v1".to_string()),
            default_weight_kg,
            tracking,
        })
    }
}

/// Read an optional variable, falling back to `default` when unset.
fn parse_var<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(name, raw)),
        Err(_) => Ok(default),
    }
}

fn parse_millis(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let millis = parse_var(name, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1:?}")]
    Invalid(&'static str, String),
}
