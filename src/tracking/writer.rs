//! Ordered persistence of route points for one session.
//!
//! Fixes are queued without waiting. A single background task holds them
//! until the activity id resolves, then appends them in arrival order.
//! The id may take as long as it needs while the session runs; once the
//! queue is closed at stop it gets `id_timeout` more. Failed batches stay
//! queued and are retried with the next flush.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::TrackingConfig;
use crate::db::ActivityStore;
use crate::error::{AppError, Result};
use crate::models::{ActivityId, LocationFix, LocationPoint};
use crate::tracking::deferred::DeferredActivityId;

const RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// Outcome of a session's point writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub activity_id: ActivityId,
    /// Points appended to the store
    pub written: usize,
    /// Points whose batch exhausted its retries
    pub unsaved: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct WriterSettings {
    pub id_timeout: Duration,
    pub attempts: u32,
    pub retry_delay: Duration,
}

impl From<&TrackingConfig> for WriterSettings {
    fn from(config: &TrackingConfig) -> Self {
        Self {
            id_timeout: config.activity_id_timeout,
            attempts: config.point_write_attempts.max(1),
            retry_delay: RETRY_BASE_DELAY,
        }
    }
}

/// Handle to a session's point-writing task.
pub struct LocationWriter {
    tx: mpsc::UnboundedSender<LocationFix>,
    handle: JoinHandle<Result<WriteReport>>,
}

impl LocationWriter {
    pub fn spawn(
        store: Arc<dyn ActivityStore>,
        activity_id: DeferredActivityId,
        settings: WriterSettings,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(store, activity_id, rx, settings));
        Self { tx, handle }
    }

    /// Queue a fix. Never waits.
    pub fn enqueue(&self, fix: LocationFix) {
        if self.tx.send(fix).is_err() {
            tracing::error!("Location writer stopped early; fix dropped");
        }
    }

    /// Close the queue and wait until everything queued is written or given up.
    ///
    /// Fails when the activity id never arrived, since then no point could
    /// be attributed.
    pub async fn finish(self) -> Result<WriteReport> {
        drop(self.tx);
        self.handle.await.map_err(|e| {
            tracing::error!(error = %e, "Location writer task failed");
            AppError::Internal(anyhow::anyhow!("location writer task failed: {}", e))
        })?
    }
}

async fn run_writer(
    store: Arc<dyn ActivityStore>,
    activity_id: DeferredActivityId,
    mut rx: mpsc::UnboundedReceiver<LocationFix>,
    settings: WriterSettings,
) -> Result<WriteReport> {
    let mut pending: Vec<LocationFix> = Vec::new();

    // Buffer fixes until the id is known
    let id_wait = activity_id.resolved();
    tokio::pin!(id_wait);
    let mut open = true;
    let resolved = loop {
        tokio::select! {
            biased;
            result = &mut id_wait => break result,
            fix = rx.recv() => match fix {
                Some(fix) => pending.push(fix),
                None => {
                    open = false;
                    break match tokio::time::timeout(settings.id_timeout, &mut id_wait).await {
                        Ok(result) => result,
                        Err(_) => Err(AppError::ActivityIdUnresolved(format!(
                            "no id within {} ms of stop",
                            settings.id_timeout.as_millis()
                        ))),
                    };
                }
            },
        }
    };

    let id = match resolved {
        Ok(id) => id,
        Err(e) => {
            while let Some(fix) = rx.recv().await {
                pending.push(fix);
            }
            tracing::error!(
                error = %e,
                unattributed_points = pending.len(),
                "Route points cannot be attributed to an activity"
            );
            return Err(e);
        }
    };
    let mut report = WriteReport {
        activity_id: id,
        written: 0,
        unsaved: 0,
    };
    tracing::debug!(activity_id = id, buffered = pending.len(), "Activity id resolved");

    loop {
        flush(store.as_ref(), id, &mut pending, &mut report, &settings).await;
        if !open {
            break;
        }
        match rx.recv().await {
            Some(fix) => {
                pending.push(fix);
                while let Ok(fix) = rx.try_recv() {
                    pending.push(fix);
                }
            }
            None => open = false,
        }
    }

    if !pending.is_empty() {
        tracing::error!(
            activity_id = id,
            unsaved_points = pending.len(),
            "Giving up on route points"
        );
    }
    report.unsaved = pending.len();
    Ok(report)
}

/// Append `pending` as one batch, retrying with backoff. On success the
/// batch is cleared; on failure it is kept for the next flush.
async fn flush(
    store: &dyn ActivityStore,
    id: ActivityId,
    pending: &mut Vec<LocationFix>,
    report: &mut WriteReport,
    settings: &WriterSettings,
) {
    if pending.is_empty() {
        return;
    }
    let points: Vec<LocationPoint> = pending
        .iter()
        .map(|fix| LocationPoint::from_fix(id, fix))
        .collect();

    for attempt in 1..=settings.attempts {
        match store.append_location_points(id, &points).await {
            Ok(()) => {
                report.written += points.len();
                pending.clear();
                return;
            }
            Err(e) => {
                tracing::warn!(
                    activity_id = id,
                    attempt,
                    batch = points.len(),
                    error = %e,
                    "Failed to append route points"
                );
                if attempt < settings.attempts {
                    tokio::time::sleep(settings.retry_delay * attempt).await;
                }
            }
        }
    }
}
