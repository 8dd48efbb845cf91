//! Location and step-sensor adapter boundary.
//!
//! Adapters push typed events into the tracking actor through a
//! [`SessionSink`]. Each sink is stamped with the epoch of the session it
//! was issued for, so callbacks that race past `stop_updates` are dropped
//! by the actor instead of leaking into the next session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc::WeakUnboundedSender;

use crate::config::TrackingConfig;
use crate::error::Result;
use crate::models::LocationFix;
use crate::tracking::service::Command;

/// Delivery parameters requested from the location provider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationRequest {
    pub interval: Duration,
    pub fastest_interval: Duration,
    pub min_distance_meters: f64,
}

impl From<&TrackingConfig> for LocationRequest {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            interval: config.location_interval,
            fastest_interval: config.fastest_location_interval,
            min_distance_meters: config.min_movement_meters,
        }
    }
}

/// Event entry point for one session.
#[derive(Debug, Clone)]
pub struct SessionSink {
    epoch: u64,
    tx: WeakUnboundedSender<Command>,
}

impl SessionSink {
    pub(crate) fn new(epoch: u64, tx: WeakUnboundedSender<Command>) -> Self {
        Self { epoch, tx }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Returns `false` once the tracking service is gone.
    pub fn location(&self, fix: LocationFix) -> bool {
        self.send(Command::Location {
            epoch: self.epoch,
            fix,
        })
    }

    pub fn location_error(&self, message: impl Into<String>) -> bool {
        self.send(Command::LocationError {
            epoch: self.epoch,
            message: message.into(),
        })
    }

    /// Cumulative device step-counter reading.
    pub fn steps(&self, device_total: u64) -> bool {
        self.send(Command::Steps {
            epoch: self.epoch,
            device_total,
        })
    }

    fn send(&self, command: Command) -> bool {
        match self.tx.upgrade() {
            Some(tx) => tx.send(command).is_ok(),
            None => false,
        }
    }
}

/// Platform location service.
pub trait LocationProvider: Send + Sync {
    /// Begin delivering fixes to `sink`, replacing any earlier sink.
    fn start_updates(&self, request: &LocationRequest, sink: SessionSink) -> Result<()>;

    fn stop_updates(&self);
}

/// Hardware step counter. Absent on some devices.
pub trait StepCounter: Send + Sync {
    fn is_available(&self) -> bool;

    fn start_updates(&self, sink: SessionSink);

    fn stop_updates(&self);
}

/// Push-based adapter for both fixes and step counts.
///
/// Whoever owns the device (an HTTP client, a test) pushes readings in;
/// they go to the sink of the session currently subscribed, or nowhere.
#[derive(Debug)]
pub struct DeviceBridge {
    location_sink: Mutex<Option<SessionSink>>,
    step_sink: Mutex<Option<SessionSink>>,
    request: Mutex<Option<LocationRequest>>,
    step_sensor: AtomicBool,
}

impl Default for DeviceBridge {
    fn default() -> Self {
        Self::new(true)
    }
}

impl DeviceBridge {
    pub fn new(has_step_sensor: bool) -> Self {
        Self {
            location_sink: Mutex::new(None),
            step_sink: Mutex::new(None),
            request: Mutex::new(None),
            step_sensor: AtomicBool::new(has_step_sensor),
        }
    }

    /// Forward a fix. Returns `false` if no session is listening.
    pub fn push_location(&self, fix: LocationFix) -> bool {
        current(&self.location_sink).is_some_and(|sink| sink.location(fix))
    }

    /// Forward a cumulative step reading. Returns `false` if no session is listening.
    pub fn push_steps(&self, device_total: u64) -> bool {
        current(&self.step_sink).is_some_and(|sink| sink.steps(device_total))
    }

    pub fn report_location_error(&self, message: impl Into<String>) -> bool {
        current(&self.location_sink).is_some_and(|sink| sink.location_error(message))
    }

    pub fn set_step_sensor_available(&self, available: bool) {
        self.step_sensor.store(available, Ordering::SeqCst);
    }

    /// Parameters of the active location subscription, if any.
    pub fn location_request(&self) -> Option<LocationRequest> {
        *lock(&self.request)
    }

    pub fn is_receiving_locations(&self) -> bool {
        lock(&self.location_sink).is_some()
    }

    pub fn is_receiving_steps(&self) -> bool {
        lock(&self.step_sink).is_some()
    }
}

impl LocationProvider for DeviceBridge {
    fn start_updates(&self, request: &LocationRequest, sink: SessionSink) -> Result<()> {
        tracing::debug!(
            epoch = sink.epoch(),
            interval_ms = request.interval.as_millis() as u64,
            min_distance_meters = request.min_distance_meters,
            "Location updates requested"
        );
        *lock(&self.request) = Some(*request);
        *lock(&self.location_sink) = Some(sink);
        Ok(())
    }

    fn stop_updates(&self) {
        *lock(&self.request) = None;
        *lock(&self.location_sink) = None;
    }
}

impl StepCounter for DeviceBridge {
    fn is_available(&self) -> bool {
        self.step_sensor.load(Ordering::SeqCst)
    }

    fn start_updates(&self, sink: SessionSink) {
        *lock(&self.step_sink) = Some(sink);
    }

    fn stop_updates(&self) {
        *lock(&self.step_sink) = None;
    }
}

fn current(slot: &Mutex<Option<SessionSink>>) -> Option<SessionSink> {
    lock(slot).clone()
}

// A panic while holding one of these locks leaves plain data behind
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
