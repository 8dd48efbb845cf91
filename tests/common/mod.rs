// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use run_tracker::config::{Config, TrackingConfig};
use run_tracker::db::{ActivityStore, MemoryStore, SettingsStore};
use run_tracker::error::{AppError, Result};
use run_tracker::models::{
    Activity, ActivityId, ActivitySummary, ActivityType, LocationFix, LocationPoint,
    UserSettings, WeatherData,
};
use run_tracker::routes::create_router;
use run_tracker::services::WeatherLookup;
use run_tracker::tracking::{
    Collaborators, DeviceBridge, ManualClock, TrackingHandle, TrackingService,
};
use run_tracker::AppState;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Degrees of latitude per meter near the equator.
#[allow(dead_code)]
pub const DEG_PER_M: f64 = 1.0 / 110_574.0;

/// A fix `north_m` meters north of the origin.
#[allow(dead_code)]
pub fn fix_at(north_m: f64, timestamp_ms: i64) -> LocationFix {
    LocationFix::new(north_m * DEG_PER_M, 0.0, timestamp_ms)
}

/// Tunables with short waits so failure paths finish quickly.
#[allow(dead_code)]
pub fn test_tracking_config() -> TrackingConfig {
    TrackingConfig {
        timer_interval: Duration::from_millis(20),
        activity_id_timeout: Duration::from_millis(500),
        ..TrackingConfig::default()
    }
}

/// Poll `check` until it holds or a second passes.
#[allow(dead_code)]
pub async fn wait_until(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Memory store with controllable draft inserts and failure injection.
pub struct TestStore {
    pub inner: MemoryStore,
    gate: watch::Sender<bool>,
    pub fail_drafts: AtomicBool,
    pub fail_finalize: AtomicBool,
    pub drafts: AtomicUsize,
    pub finalize_calls: AtomicUsize,
}

#[allow(dead_code)]
impl TestStore {
    /// Draft inserts complete immediately.
    pub fn open() -> Arc<Self> {
        Self::build(true)
    }

    /// Draft inserts wait until [`TestStore::release_drafts`].
    pub fn gated() -> Arc<Self> {
        Self::build(false)
    }

    fn build(open: bool) -> Arc<Self> {
        let (gate, _) = watch::channel(open);
        Arc::new(Self {
            inner: MemoryStore::new(UserSettings::with_weight(70.0)),
            gate,
            fail_drafts: AtomicBool::new(false),
            fail_finalize: AtomicBool::new(false),
            drafts: AtomicUsize::new(0),
            finalize_calls: AtomicUsize::new(0),
        })
    }

    pub fn release_drafts(&self) {
        self.gate.send_replace(true);
    }

    pub fn finalize_count(&self) -> usize {
        self.finalize_calls.load(Ordering::SeqCst)
    }

    pub async fn saved_activity(&self, id: ActivityId) -> Activity {
        self.inner
            .get_activity(id)
            .await
            .unwrap()
            .expect("activity exists")
    }

    pub async fn saved_points(&self, id: ActivityId) -> Vec<LocationPoint> {
        self.inner.get_location_points(id).await.unwrap()
    }
}

#[async_trait]
impl ActivityStore for TestStore {
    async fn create_draft(
        &self,
        activity_type: ActivityType,
        start_time: i64,
    ) -> Result<ActivityId> {
        self.drafts.fetch_add(1, Ordering::SeqCst);
        let mut gate = self.gate.subscribe();
        gate.wait_for(|open| *open)
            .await
            .map_err(|_| AppError::Storage("gate closed".to_string()))?;
        if self.fail_drafts.load(Ordering::SeqCst) {
            return Err(AppError::Storage("disk I/O error".to_string()));
        }
        self.inner.create_draft(activity_type, start_time).await
    }

    async fn finalize(&self, id: ActivityId, summary: &ActivitySummary) -> Result<()> {
        self.finalize_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_finalize.load(Ordering::SeqCst) {
            return Err(AppError::Storage("database is locked".to_string()));
        }
        self.inner.finalize(id, summary).await
    }

    async fn append_location_points(
        &self,
        id: ActivityId,
        points: &[LocationPoint],
    ) -> Result<()> {
        self.inner.append_location_points(id, points).await
    }

    async fn get_activity(&self, id: ActivityId) -> Result<Option<Activity>> {
        self.inner.get_activity(id).await
    }

    async fn list_activities(&self) -> Result<Vec<Activity>> {
        self.inner.list_activities().await
    }

    async fn get_location_points(&self, id: ActivityId) -> Result<Vec<LocationPoint>> {
        self.inner.get_location_points(id).await
    }

    async fn set_public(&self, id: ActivityId, is_public: bool) -> Result<()> {
        self.inner.set_public(id, is_public).await
    }

    async fn mark_synced(&self, id: ActivityId) -> Result<()> {
        self.inner.mark_synced(id).await
    }

    async fn delete_activity(&self, id: ActivityId) -> Result<bool> {
        self.inner.delete_activity(id).await
    }
}

#[async_trait]
impl SettingsStore for TestStore {
    async fn get_settings(&self) -> Result<UserSettings> {
        self.inner.get_settings().await
    }

    async fn update_settings(&self, settings: &UserSettings) -> Result<()> {
        self.inner.update_settings(settings).await
    }
}

/// Weather lookup returning a canned answer, or failing.
pub struct FakeWeather {
    pub fail: bool,
    pub calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeWeather {
    pub fn sunny() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn broken() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherLookup for FakeWeather {
    async fn lookup(&self, _latitude: f64, _longitude: f64) -> Result<WeatherData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Weather("HTTP 503: unavailable".to_string()));
        }
        Ok(WeatherData::new(18.5, 60, 1, 12.0))
    }
}

/// A running tracking service wired to test doubles.
#[allow(dead_code)]
pub struct TestTracker {
    pub handle: TrackingHandle,
    pub store: Arc<TestStore>,
    pub weather: Arc<FakeWeather>,
    pub device: Arc<DeviceBridge>,
    pub clock: ManualClock,
}

#[allow(dead_code)]
pub fn spawn_tracker(store: Arc<TestStore>, weather: Arc<FakeWeather>) -> TestTracker {
    spawn_tracker_with_device(store, weather, Arc::new(DeviceBridge::default()))
}

#[allow(dead_code)]
pub fn spawn_tracker_with_device(
    store: Arc<TestStore>,
    weather: Arc<FakeWeather>,
    device: Arc<DeviceBridge>,
) -> TestTracker {
    let clock = ManualClock::new(1_700_000_000_000);
    let handle = TrackingService::new(
        test_tracking_config(),
        Collaborators {
            store: store.clone(),
            settings: store.clone(),
            weather: weather.clone(),
            location: device.clone(),
            steps: device.clone(),
        },
    )
    .with_clock(Arc::new(clock.clone()))
    .spawn();

    TestTracker {
        handle,
        store,
        weather,
        device,
        clock,
    }
}

/// Create a test app backed by test doubles.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let config = Config {
        tracking: test_tracking_config(),
        ..Config::default()
    };
    let tracker = spawn_tracker(TestStore::open(), FakeWeather::sunny());

    let state = Arc::new(AppState {
        config,
        store: tracker.store.clone(),
        settings: tracker.store.clone(),
        tracker: tracker.handle,
        device: tracker.device,
    });

    (create_router(state.clone()), state)
}
