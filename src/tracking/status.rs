//! Published session state.
//!
//! One [`StatusPublisher`] (owned by the tracking actor) overwrites a
//! single latest-value slot; any number of [`SessionStatus`] readers see
//! the newest [`TrackingState`]. Publishing never waits for readers.

use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::models::TrackingState;

/// Create the publisher and its first reader.
pub fn session_status() -> (StatusPublisher, SessionStatus) {
    let (tx, rx) = watch::channel(TrackingState::default());
    (StatusPublisher { tx }, SessionStatus { rx })
}

/// Sole writer of the session state.
#[derive(Debug)]
pub struct StatusPublisher {
    tx: watch::Sender<TrackingState>,
}

impl StatusPublisher {
    /// Replace the published state.
    pub fn publish(&self, state: TrackingState) {
        // send_replace succeeds with zero receivers
        self.tx.send_replace(state);
    }
}

/// Read-only view of the live session.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    rx: watch::Receiver<TrackingState>,
}

impl SessionStatus {
    pub fn current(&self) -> TrackingState {
        self.rx.borrow().clone()
    }

    pub fn is_tracking(&self) -> bool {
        self.rx.borrow().is_tracking
    }

    /// A receiver positioned at the latest state.
    pub fn subscribe(&self) -> watch::Receiver<TrackingState> {
        let mut rx = self.rx.clone();
        rx.borrow_and_update();
        rx
    }

    /// Stream yielding the latest state, then each later update.
    /// Intermediate states may be skipped.
    pub fn updates(&self) -> WatchStream<TrackingState> {
        WatchStream::new(self.rx.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    fn state_with_distance(distance_meters: f64) -> TrackingState {
        TrackingState {
            is_tracking: true,
            distance_meters,
            ..Default::default()
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let (publisher, status) = session_status();
        drop(status);
        publisher.publish(state_with_distance(1.0));
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_only_latest() {
        let (publisher, status) = session_status();
        for d in 1..=100 {
            publisher.publish(state_with_distance(d as f64));
        }

        let mut updates = status.updates();
        let first = updates.next().await.unwrap();
        assert_eq!(first.distance_meters, 100.0);

        // No backlog: nothing else is ready until a new publish
        let pending =
            tokio::time::timeout(std::time::Duration::from_millis(20), updates.next()).await;
        assert!(pending.is_err());

        publisher.publish(state_with_distance(101.0));
        assert_eq!(updates.next().await.unwrap().distance_meters, 101.0);
    }

    #[tokio::test]
    async fn test_subscriber_notified_of_change() {
        let (publisher, status) = session_status();
        let mut rx = status.subscribe();

        publisher.publish(state_with_distance(5.0));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().distance_meters, 5.0);
        assert!(status.is_tracking());
        assert_eq!(status.current().distance_meters, 5.0);
    }
}
