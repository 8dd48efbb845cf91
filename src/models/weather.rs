//! Weather conditions attached to an activity.

use serde::{Deserialize, Serialize};

/// Snapshot of current conditions, captured once per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherData {
    pub temperature_celsius: f64,
    pub humidity_pct: i32,
    /// WMO weather interpretation code
    pub weather_code: i32,
    pub wind_speed_kmh: f64,
    pub description: String,
}

impl WeatherData {
    pub fn new(
        temperature_celsius: f64,
        humidity_pct: i32,
        weather_code: i32,
        wind_speed_kmh: f64,
    ) -> Self {
        Self {
            temperature_celsius,
            humidity_pct,
            weather_code,
            wind_speed_kmh,
            description: describe_weather_code(weather_code).to_string(),
        }
    }
}

/// Human-readable text for a WMO weather interpretation code.
pub fn describe_weather_code(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 | 48 => "Foggy",
        51 | 53 | 55 => "Drizzle",
        56 | 57 => "Freezing drizzle",
        61 | 63 | 65 => "Rain",
        66 | 67 => "Freezing rain",
        71 | 73 | 75 => "Snow",
        77 => "Snow grains",
        80..=82 => "Rain showers",
        85 | 86 => "Snow showers",
        95 => "Thunderstorm",
        96 | 99 => "Thunderstorm with hail",
        _ => "Unknown",
    }
}
