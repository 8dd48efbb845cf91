//! Single-assignment activity id.
//!
//! The draft row is inserted after `start()` returns, so the id arrives
//! later. Exactly one [`ActivityIdResolver`] completes it; any number of
//! [`DeferredActivityId`] clones await it without blocking each other.
//! A session that gives up on the id abandons it, and the resolver then
//! learns that the row it created has no owner.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use futures_util::future::{FutureExt, Shared};
use tokio::sync::oneshot;

use crate::error::{AppError, Result};
use crate::models::ActivityId;

type DraftOutcome = std::result::Result<ActivityId, String>;

/// Create a linked resolver / deferred pair.
pub fn deferred_activity_id() -> (ActivityIdResolver, DeferredActivityId) {
    let (tx, rx) = oneshot::channel();
    let abandoned = Arc::new(Mutex::new(false));
    (
        ActivityIdResolver {
            tx,
            abandoned: abandoned.clone(),
        },
        DeferredActivityId {
            inner: rx.shared(),
            abandoned,
        },
    )
}

/// Write side. Consumed on use, so the id can only be set once.
///
/// Dropping it unresolved fails every waiter.
#[derive(Debug)]
pub struct ActivityIdResolver {
    tx: oneshot::Sender<DraftOutcome>,
    abandoned: Arc<Mutex<bool>>,
}

impl ActivityIdResolver {
    /// Publish the id. `false` if the session already gave up on it, in
    /// which case the caller owns the orphaned row.
    pub fn resolve(self, id: ActivityId) -> bool {
        let abandoned = lock(&self.abandoned);
        if *abandoned {
            return false;
        }
        self.tx.send(Ok(id)).is_ok()
    }

    pub fn fail(self, reason: impl Into<String>) {
        let _ = self.tx.send(Err(reason.into()));
    }
}

/// Read side.
#[derive(Clone)]
pub struct DeferredActivityId {
    inner: Shared<oneshot::Receiver<DraftOutcome>>,
    abandoned: Arc<Mutex<bool>>,
}

impl std::fmt::Debug for DeferredActivityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DeferredActivityId")
            .field(&self.peek())
            .finish()
    }
}

impl DeferredActivityId {
    /// The id, if it has already been assigned.
    pub fn peek(&self) -> Option<ActivityId> {
        match self.inner.peek() {
            Some(Ok(Ok(id))) => Some(*id),
            _ => None,
        }
    }

    /// Wait for the id with no deadline.
    pub async fn resolved(&self) -> Result<ActivityId> {
        match self.inner.clone().await {
            Ok(Ok(id)) => Ok(id),
            Ok(Err(reason)) => Err(AppError::ActivityIdUnresolved(format!(
                "draft insert failed: {}",
                reason
            ))),
            Err(_) => Err(AppError::ActivityIdUnresolved(
                "draft insert was abandoned".to_string(),
            )),
        }
    }

    /// Wait up to `timeout` for the id.
    pub async fn wait(&self, timeout: Duration) -> Result<ActivityId> {
        tokio::time::timeout(timeout, self.resolved())
            .await
            .unwrap_or_else(|_| {
                Err(AppError::ActivityIdUnresolved(format!(
                    "no id after {} ms",
                    timeout.as_millis()
                )))
            })
    }

    /// Stop accepting the id. Returns an id that was assigned before this
    /// call; its row must be cleaned up by the caller.
    pub fn abandon(&self) -> Option<ActivityId> {
        *lock(&self.abandoned) = true;
        match self.inner.clone().now_or_never() {
            Some(Ok(Ok(id))) => Some(id),
            _ => None,
        }
    }
}

fn lock(flag: &Mutex<bool>) -> MutexGuard<'_, bool> {
    flag.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
