//! Live session state machine.
//!
//! Pure bookkeeping: every method takes the current time explicitly and
//! performs no I/O, so the actor in [`super::service`] can drive it one
//! event at a time.
//!
//! Elapsed time is `(paused ? pause_instant : now) - start - total_paused`.

use crate::models::activity::{average_pace_seconds_per_km, calories_burned};
use crate::models::{ActivitySummary, ActivityType, LocationFix, TrackingState, WeatherData};

/// Result of feeding an unpaused session one fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixOutcome {
    /// Meters added to the distance, if the move cleared the jitter threshold
    pub distance_added: Option<f64>,
    /// First fix of the session: time to look up the weather
    pub first_fix: bool,
}

/// Accumulated statistics for one tracking session.
#[derive(Debug, Clone)]
pub struct Session {
    activity_type: ActivityType,
    started_at: i64,
    paused_at: Option<i64>,
    total_paused_ms: i64,
    weight_kg: f64,
    min_movement_meters: f64,

    distance_meters: f64,
    current_speed_mps: f32,
    calories: i32,
    avg_pace_seconds_per_km: f64,

    steps: u32,
    last_step_reading: Option<u64>,

    previous_fix: Option<LocationFix>,
    seen_fix: bool,
    weather: Option<WeatherData>,
}

impl Session {
    pub fn new(
        activity_type: ActivityType,
        started_at: i64,
        weight_kg: f64,
        min_movement_meters: f64,
    ) -> Self {
        Self {
            activity_type,
            started_at,
            paused_at: None,
            total_paused_ms: 0,
            weight_kg,
            min_movement_meters,
            distance_meters: 0.0,
            current_speed_mps: 0.0,
            calories: 0,
            avg_pace_seconds_per_km: 0.0,
            steps: 0,
            last_step_reading: None,
            previous_fix: None,
            seen_fix: false,
            weather: None,
        }
    }

    pub fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    pub fn started_at(&self) -> i64 {
        self.started_at
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn calories(&self) -> i32 {
        self.calories
    }

    pub fn weather(&self) -> Option<&WeatherData> {
        self.weather.as_ref()
    }

    /// Moving time in milliseconds at `now`.
    pub fn elapsed_ms(&self, now: i64) -> i64 {
        let end = self.paused_at.unwrap_or(now);
        (end - self.started_at - self.total_paused_ms).max(0)
    }

    /// Replace the weight used for calories from here on.
    pub fn set_weight(&mut self, weight_kg: f64) {
        self.weight_kg = weight_kg;
    }

    pub fn set_weather(&mut self, weather: WeatherData) {
        self.weather = Some(weather);
    }

    /// Returns `false` if already paused.
    pub fn pause(&mut self, now: i64) -> bool {
        if self.paused_at.is_some() {
            return false;
        }
        self.paused_at = Some(now);
        true
    }

    /// Returns `false` if not paused.
    pub fn resume(&mut self, now: i64) -> bool {
        let Some(paused_at) = self.paused_at.take() else {
            return false;
        };
        self.total_paused_ms += (now - paused_at).max(0);
        // Movement while paused is not distance
        self.previous_fix = None;
        true
    }

    /// Feed one fix. `None` when paused (the fix is ignored entirely).
    ///
    /// The previous fix always advances, so a run of sub-threshold moves
    /// never adds up to distance.
    pub fn on_fix(&mut self, fix: &LocationFix, now: i64) -> Option<FixOutcome> {
        if self.is_paused() {
            return None;
        }

        let first_fix = !self.seen_fix;
        self.seen_fix = true;

        let distance_added = match &self.previous_fix {
            Some(previous) => {
                let delta = previous.distance_to(fix);
                (delta > self.min_movement_meters).then_some(delta)
            }
            None => None,
        };

        if let Some(delta) = distance_added {
            self.distance_meters += delta;
            self.current_speed_mps = fix.speed_mps.unwrap_or(0.0);
            // A lower weight arriving mid-session must not take calories back
            let burned = calories_burned(self.activity_type, self.weight_kg, self.elapsed_ms(now));
            self.calories = self.calories.max(burned);
        }

        self.previous_fix = Some(fix.clone());

        Some(FixOutcome {
            distance_added,
            first_fix,
        })
    }

    /// Feed a cumulative device step-counter reading.
    ///
    /// The first reading is the baseline. Steps taken while paused are
    /// skipped. A reading below the previous one (counter reset) becomes
    /// the new baseline. Returns `true` if the session count changed.
    pub fn on_step_count(&mut self, device_total: u64) -> bool {
        let previous = self.last_step_reading.replace(device_total);
        let Some(previous) = previous else {
            return false;
        };
        if self.is_paused() || device_total <= previous {
            return false;
        }
        let delta = u32::try_from(device_total - previous).unwrap_or(u32::MAX);
        self.steps = self.steps.saturating_add(delta);
        true
    }

    /// Timer tick: refresh the live pace. Returns `false` while paused.
    pub fn on_tick(&mut self, now: i64) -> bool {
        if self.is_paused() {
            return false;
        }
        self.avg_pace_seconds_per_km = if self.distance_meters > 0.0 {
            (self.elapsed_ms(now) as f64 / 1000.0) / (self.distance_meters / 1000.0)
        } else {
            0.0
        };
        true
    }

    pub fn snapshot(&self, now: i64) -> TrackingState {
        TrackingState {
            activity_type: self.activity_type,
            is_tracking: true,
            is_paused: self.is_paused(),
            duration_millis: self.elapsed_ms(now),
            distance_meters: self.distance_meters,
            current_speed_mps: self.current_speed_mps,
            avg_pace_seconds_per_km: self.avg_pace_seconds_per_km,
            steps: self.steps,
            calories: self.calories,
        }
    }

    /// Final stats for a session stopped at `now`.
    pub fn finish(&self, now: i64) -> ActivitySummary {
        let duration_ms = self.elapsed_ms(now);
        ActivitySummary {
            end_time: now,
            distance_meters: self.distance_meters,
            duration_seconds: duration_ms / 1000,
            calories_burned: self.calories,
            avg_pace_seconds_per_km: average_pace_seconds_per_km(duration_ms, self.distance_meters),
            step_count: self.steps,
            weather: self.weather.clone(),
        }
    }
}
