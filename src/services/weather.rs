// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Open-Meteo client for current weather conditions.
//!
//! Used once per session, best-effort: callers log failures and carry on.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::AppError;
use crate::models::WeatherData;

const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Fields requested from the `current` block.
const CURRENT_WEATHER_PARAMS: &str =
    "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m";

/// Current-conditions lookup by coordinates.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<WeatherData, AppError>;
}

/// Open-Meteo forecast API client.
#[derive(Clone)]
pub struct OpenMeteoClient {
    http: reqwest::Client,
    base_url: String,
}

impl OpenMeteoClient {
    /// Create a client against `base_url` (e.g. `https://api.open-meteo.com/v1`).
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_timeout(base_url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building Open-Meteo HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 429 {
                tracing::warn!("Open-Meteo rate limit hit (429)");
            }
            return Err(AppError::Weather(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Weather(format!("Invalid response body: {}", e)))
    }
}

#[async_trait]
impl WeatherLookup for OpenMeteoClient {
    async fn lookup(&self, latitude: f64, longitude: f64) -> Result<WeatherData, AppError> {
        let url = format!("{}/forecast", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_WEATHER_PARAMS.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Weather(e.to_string()))?;

        let body: ForecastResponse = self.check_response_json(response).await?;
        Ok(body.current.into())
    }
}

/// `GET /forecast` response (only the parts we use).
#[derive(Debug, Deserialize)]
struct ForecastResponse {
    current: CurrentWeather,
}

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    temperature_2m: f64,
    relative_humidity_2m: i32,
    weather_code: i32,
    wind_speed_10m: f64,
}

impl From<CurrentWeather> for WeatherData {
    fn from(current: CurrentWeather) -> Self {
        WeatherData::new(
            current.temperature_2m,
            current.relative_humidity_2m,
            current.weather_code,
            current.wind_speed_10m,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forecast_response() {
        let json = r#"{
            "latitude": 37.42,
            "longitude": -122.08,
            "current_units": {"temperature_2m": "°C"},
            "current": {
                "time": "2024-05-01T14:00",
                "interval": 900,
                "temperature_2m": 21.3,
                "relative_humidity_2m": 48,
                "weather_code": 2,
                "wind_speed_10m": 9.7
            }
        }"#;

        let parsed: ForecastResponse = serde_json::from_str(json).unwrap();
        let weather: WeatherData = parsed.current.into();

        assert_eq!(weather.temperature_celsius, 21.3);
        assert_eq!(weather.humidity_pct, 48);
        assert_eq!(weather.wind_speed_kmh, 9.7);
        assert_eq!(weather.description, "Partly cloudy");
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_weather_error() {
        // Port 9 (discard) on localhost is not an HTTP server
        let client = OpenMeteoClient::new("http://127.0.0.1:9/v1").unwrap();
        let result = client.lookup(0.0, 0.0).await;
        assert!(matches!(result, Err(AppError::Weather(_))));
    }

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        // Accepts connections and never answers
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client =
            OpenMeteoClient::with_timeout(format!("http://{}/v1", addr), Duration::from_millis(100))
                .unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), client.lookup(1.0, 2.0))
            .await
            .expect("lookup gives up on its own");
        assert!(matches!(result, Err(AppError::Weather(_))));
    }
}
