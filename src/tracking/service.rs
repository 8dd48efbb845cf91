// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Tracking service: the single owner of the live session.
//!
//! Control calls from [`TrackingHandle`] and events from the adapters, the
//! timer and background lookups all arrive as [`Command`]s on one channel
//! and are applied to the [`Session`] one at a time. The only waits happen
//! off the actor: the draft insert, the weather lookup and the end-of-session
//! commit run as spawned tasks that report back by message.

use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, WeakUnboundedSender};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::TrackingConfig;
use crate::db::{ActivityStore, SettingsStore};
use crate::error::{AppError, Result};
use crate::models::{ActivityId, ActivitySummary, ActivityType, LocationFix, WeatherData};
use crate::services::WeatherLookup;
use crate::tracking::adapters::{LocationProvider, LocationRequest, SessionSink, StepCounter};
use crate::tracking::clock::{Clock, SystemClock};
use crate::tracking::deferred::{deferred_activity_id, DeferredActivityId};
use crate::tracking::session::Session;
use crate::tracking::status::{session_status, SessionStatus, StatusPublisher};
use crate::tracking::writer::{LocationWriter, WriterSettings};

/// External collaborators the tracking core reads from and writes to.
#[derive(Clone)]
pub struct Collaborators {
    pub store: Arc<dyn ActivityStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub weather: Arc<dyn WeatherLookup>,
    pub location: Arc<dyn LocationProvider>,
    pub steps: Arc<dyn StepCounter>,
}

/// Messages processed by the tracking actor.
#[derive(Debug)]
pub(crate) enum Command {
    Start {
        activity_type: ActivityType,
        reply: oneshot::Sender<bool>,
    },
    Pause {
        reply: oneshot::Sender<bool>,
    },
    Resume {
        reply: oneshot::Sender<bool>,
    },
    Stop {
        reply: oneshot::Sender<Result<Option<ActivityId>>>,
    },
    CurrentActivity {
        reply: oneshot::Sender<Option<DeferredActivityId>>,
    },
    Location {
        epoch: u64,
        fix: LocationFix,
    },
    LocationError {
        epoch: u64,
        message: String,
    },
    Steps {
        epoch: u64,
        device_total: u64,
    },
    Tick {
        epoch: u64,
    },
    WeightLoaded {
        epoch: u64,
        weight_kg: f64,
    },
    WeatherLoaded {
        epoch: u64,
        weather: WeatherData,
    },
}

/// Builder for the tracking actor.
pub struct TrackingService {
    config: TrackingConfig,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
}

impl TrackingService {
    pub fn new(config: TrackingConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Start the actor. It runs until every [`TrackingHandle`] is dropped.
    pub fn spawn(self) -> TrackingHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let (publisher, status) = session_status();

        let actor = Actor {
            config: self.config,
            collaborators: self.collaborators,
            clock: self.clock,
            publisher,
            tx: tx.downgrade(),
            epoch: 0,
            active: None,
        };
        tokio::spawn(actor.run(rx));

        TrackingHandle { tx, status }
    }
}

/// Cloneable control surface for the tracking actor.
#[derive(Clone)]
pub struct TrackingHandle {
    tx: UnboundedSender<Command>,
    status: SessionStatus,
}

impl TrackingHandle {
    /// Begin a session. `false` if one is already active.
    pub async fn start(&self, activity_type: ActivityType) -> Result<bool> {
        self.request(|reply| Command::Start {
            activity_type,
            reply,
        })
        .await
    }

    /// `false` if not tracking or already paused.
    pub async fn pause(&self) -> Result<bool> {
        self.request(|reply| Command::Pause { reply }).await
    }

    /// `false` if not paused.
    pub async fn resume(&self) -> Result<bool> {
        self.request(|reply| Command::Resume { reply }).await
    }

    /// End the session and commit it.
    ///
    /// `Ok(None)` when nothing was being tracked. Errors mean the workout
    /// could not be saved.
    pub async fn stop(&self) -> Result<Option<ActivityId>> {
        self.request(|reply| Command::Stop { reply }).await?
    }

    /// Id of the live session's activity, if the draft has been created.
    pub async fn current_activity_id(&self) -> Result<Option<ActivityId>> {
        let deferred = self
            .request(|reply| Command::CurrentActivity { reply })
            .await?;
        Ok(deferred.and_then(|d| d.peek()))
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .map_err(|_| AppError::SessionClosed)?;
        rx.await.map_err(|_| AppError::SessionClosed)
    }
}

struct ActiveSession {
    epoch: u64,
    session: Session,
    activity_id: DeferredActivityId,
    writer: LocationWriter,
    timer: JoinHandle<()>,
}

struct Actor {
    config: TrackingConfig,
    collaborators: Collaborators,
    clock: Arc<dyn Clock>,
    publisher: StatusPublisher,
    tx: WeakUnboundedSender<Command>,
    epoch: u64,
    active: Option<ActiveSession>,
}

impl Actor {
    async fn run(mut self, mut rx: UnboundedReceiver<Command>) {
        while let Some(command) = rx.recv().await {
            self.handle(command);
        }

        if let Some(active) = self.active.take() {
            tracing::warn!(
                epoch = active.epoch,
                "Tracking service shut down with a live session; it was not saved"
            );
            self.halt_inputs(&active);
        }
        tracing::debug!("Tracking service stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Start {
                activity_type,
                reply,
            } => {
                let _ = reply.send(self.start(activity_type));
            }
            Command::Pause { reply } => {
                let _ = reply.send(self.pause());
            }
            Command::Resume { reply } => {
                let _ = reply.send(self.resume());
            }
            Command::Stop { reply } => self.stop(reply),
            Command::CurrentActivity { reply } => {
                let _ = reply.send(self.active.as_ref().map(|a| a.activity_id.clone()));
            }
            Command::Location { epoch, fix } => self.on_location(epoch, fix),
            Command::LocationError { epoch, message } => {
                if self.is_current(epoch) {
                    tracing::warn!(epoch, error = %message, "Location adapter error");
                }
            }
            Command::Steps {
                epoch,
                device_total,
            } => self.on_steps(epoch, device_total),
            Command::Tick { epoch } => self.on_tick(epoch),
            Command::WeightLoaded { epoch, weight_kg } => {
                if let Some(active) = self.current_mut(epoch) {
                    active.session.set_weight(weight_kg);
                    tracing::debug!(epoch, weight_kg, "Body weight loaded");
                }
            }
            Command::WeatherLoaded { epoch, weather } => {
                if let Some(active) = self.current_mut(epoch) {
                    tracing::info!(
                        epoch,
                        temperature_celsius = weather.temperature_celsius,
                        description = %weather.description,
                        "Weather captured"
                    );
                    active.session.set_weather(weather);
                }
            }
        }
    }

    fn start(&mut self, activity_type: ActivityType) -> bool {
        if self.active.is_some() {
            tracing::debug!("Start ignored: a session is already active");
            return false;
        }

        self.epoch += 1;
        let epoch = self.epoch;
        let now = self.clock.now_millis();
        let session = Session::new(
            activity_type,
            now,
            self.config.fallback_weight_kg,
            self.config.min_movement_meters,
        );

        let (resolver, activity_id) = deferred_activity_id();
        let writer = LocationWriter::spawn(
            self.collaborators.store.clone(),
            activity_id.clone(),
            WriterSettings::from(&self.config),
        );

        // Weight snapshot for calorie math
        let settings = self.collaborators.settings.clone();
        let tx = self.tx.clone();
        tokio::spawn(async move {
            match settings.current_weight_kg().await {
                Ok(weight_kg) if weight_kg.is_finite() && weight_kg > 0.0 => {
                    send(&tx, Command::WeightLoaded { epoch, weight_kg });
                }
                Ok(weight_kg) => {
                    tracing::warn!(epoch, weight_kg, "Ignoring implausible body weight");
                }
                Err(e) => {
                    tracing::warn!(epoch, error = %e, "Could not read body weight; using default");
                }
            }
        });

        // Draft row; resolves the activity id
        let store = self.collaborators.store.clone();
        tokio::spawn(async move {
            match store.create_draft(activity_type, now).await {
                Ok(id) => {
                    if resolver.resolve(id) {
                        tracing::info!(epoch, activity_id = id, "Draft activity created");
                    } else {
                        tracing::warn!(
                            epoch,
                            activity_id = id,
                            "Draft created after its session gave up; deleting it"
                        );
                        if let Err(e) = store.delete_activity(id).await {
                            tracing::error!(
                                epoch,
                                activity_id = id,
                                error = %e,
                                "Failed to delete orphaned draft"
                            );
                        }
                    }
                }
                Err(e) => {
                    tracing::error!(epoch, error = %e, "Failed to create draft activity");
                    resolver.fail(e.to_string());
                }
            }
        });

        let sink = SessionSink::new(epoch, self.tx.clone());
        let request = LocationRequest::from(&self.config);
        if let Err(e) = self
            .collaborators
            .location
            .start_updates(&request, sink.clone())
        {
            tracing::warn!(epoch, error = %e, "Location updates unavailable");
        }
        if self.collaborators.steps.is_available() {
            self.collaborators.steps.start_updates(sink);
        } else {
            tracing::info!(epoch, "No step sensor; step count stays at zero");
        }

        let timer = spawn_timer(self.tx.clone(), epoch, self.config.timer_interval);

        self.publisher.publish(session.snapshot(now));
        tracing::info!(epoch, activity_type = %activity_type, "Tracking started");

        self.active = Some(ActiveSession {
            epoch,
            session,
            activity_id,
            writer,
            timer,
        });
        true
    }

    fn pause(&mut self) -> bool {
        let now = self.clock.now_millis();
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if !active.session.pause(now) {
            return false;
        }
        tracing::info!(
            epoch = active.epoch,
            elapsed_ms = active.session.elapsed_ms(now),
            "Tracking paused"
        );
        self.publisher.publish(active.session.snapshot(now));
        true
    }

    fn resume(&mut self) -> bool {
        let now = self.clock.now_millis();
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        if !active.session.resume(now) {
            return false;
        }
        tracing::info!(epoch = active.epoch, "Tracking resumed");
        self.publisher.publish(active.session.snapshot(now));
        true
    }

    fn stop(&mut self, reply: oneshot::Sender<Result<Option<ActivityId>>>) {
        let Some(active) = self.active.take() else {
            let _ = reply.send(Ok(None));
            return;
        };
        self.halt_inputs(&active);

        let now = self.clock.now_millis();
        let summary = active.session.finish(now);
        self.publisher.publish(Default::default());
        tracing::info!(
            epoch = active.epoch,
            distance_meters = summary.distance_meters,
            duration_seconds = summary.duration_seconds,
            steps = summary.step_count,
            calories = summary.calories_burned,
            "Tracking stopped"
        );

        let store = self.collaborators.store.clone();
        tokio::spawn(async move {
            let result = commit(store, active.activity_id, active.writer, summary).await;
            let _ = reply.send(result);
        });
    }

    fn halt_inputs(&self, active: &ActiveSession) {
        self.collaborators.location.stop_updates();
        self.collaborators.steps.stop_updates();
        active.timer.abort();
    }

    fn on_location(&mut self, epoch: u64, fix: LocationFix) {
        let now = self.clock.now_millis();
        let weather = self.collaborators.weather.clone();
        let tx = self.tx.clone();

        let Some(active) = self.current_mut(epoch) else {
            tracing::debug!(epoch, "Dropping location from a finished session");
            return;
        };
        if !fix.has_valid_coordinates() {
            tracing::warn!(
                epoch,
                latitude = fix.latitude,
                longitude = fix.longitude,
                "Dropping fix with invalid coordinates"
            );
            return;
        }
        let Some(outcome) = active.session.on_fix(&fix, now) else {
            return;
        };

        if outcome.first_fix {
            let (latitude, longitude) = (fix.latitude, fix.longitude);
            tokio::spawn(async move {
                match weather.lookup(latitude, longitude).await {
                    Ok(data) => {
                        send(&tx, Command::WeatherLoaded { epoch, weather: data });
                    }
                    Err(e) => {
                        tracing::warn!(
                            epoch,
                            error = %e,
                            "Weather lookup failed; continuing without it"
                        );
                    }
                }
            });
        }

        active.writer.enqueue(fix);
        let snapshot = active.session.snapshot(now);
        self.publisher.publish(snapshot);
    }

    fn on_steps(&mut self, epoch: u64, device_total: u64) {
        let now = self.clock.now_millis();
        let Some(active) = self.current_mut(epoch) else {
            tracing::debug!(epoch, "Dropping step count from a finished session");
            return;
        };
        if active.session.on_step_count(device_total) {
            let snapshot = active.session.snapshot(now);
            self.publisher.publish(snapshot);
        }
    }

    fn on_tick(&mut self, epoch: u64) {
        let now = self.clock.now_millis();
        let Some(active) = self.current_mut(epoch) else {
            return;
        };
        if active.session.on_tick(now) {
            let snapshot = active.session.snapshot(now);
            self.publisher.publish(snapshot);
        }
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.active.as_ref().is_some_and(|a| a.epoch == epoch)
    }

    fn current_mut(&mut self, epoch: u64) -> Option<&mut ActiveSession> {
        self.active.as_mut().filter(|a| a.epoch == epoch)
    }
}

/// Wait for the id and the route writes, then write the final stats.
///
/// The id wait is bounded by the writer, which gives the draft insert
/// `activity_id_timeout` from stop before failing.
async fn commit(
    store: Arc<dyn ActivityStore>,
    activity_id: DeferredActivityId,
    writer: LocationWriter,
    summary: ActivitySummary,
) -> Result<Option<ActivityId>> {
    let report = match writer.finish().await {
        Ok(report) => report,
        Err(e) => {
            if let Some(id) = activity_id.abandon() {
                // Resolved between the writer giving up and now
                if let Err(delete_err) = store.delete_activity(id).await {
                    tracing::error!(
                        activity_id = id,
                        error = %delete_err,
                        "Failed to delete orphaned draft"
                    );
                }
            }
            tracing::error!(
                error = %e,
                distance_meters = summary.distance_meters,
                "Workout could not be saved"
            );
            return Err(e);
        }
    };
    let id = report.activity_id;

    if report.unsaved > 0 {
        tracing::warn!(
            activity_id = id,
            written = report.written,
            unsaved = report.unsaved,
            "Route saved incompletely"
        );
    }

    store.finalize(id, &summary).await.inspect_err(|e| {
        tracing::error!(activity_id = id, error = %e, "Failed to finalize activity");
    })?;
    tracing::info!(activity_id = id, points = report.written, "Activity saved");
    Ok(Some(id))
}

fn spawn_timer(
    tx: WeakUnboundedSender<Command>,
    epoch: u64,
    period: std::time::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            if !send(&tx, Command::Tick { epoch }) {
                break;
            }
        }
    })
}

fn send(tx: &WeakUnboundedSender<Command>, command: Command) -> bool {
    tx.upgrade().is_some_and(|tx| tx.send(command).is_ok())
}
