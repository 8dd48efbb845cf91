//! Storage layer.
//!
//! The tracking core only talks to storage through [`ActivityStore`] and
//! [`SettingsStore`]. [`MemoryStore`] implements both.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Activity, ActivityId, ActivitySummary, ActivityType, LocationPoint, UserSettings,
};

/// Persistent activities and their routes.
#[async_trait]
pub trait ActivityStore: Send + Sync {
    /// Insert an empty activity and return its assigned id.
    async fn create_draft(&self, activity_type: ActivityType, start_time: i64)
        -> Result<ActivityId>;

    /// Write the end-of-session stats for an activity.
    async fn finalize(&self, id: ActivityId, summary: &ActivitySummary) -> Result<()>;

    /// Append route points, preserving the given order.
    async fn append_location_points(&self, id: ActivityId, points: &[LocationPoint])
        -> Result<()>;

    async fn get_activity(&self, id: ActivityId) -> Result<Option<Activity>>;

    /// All activities, newest first.
    async fn list_activities(&self) -> Result<Vec<Activity>>;

    /// Route points for an activity in arrival order.
    async fn get_location_points(&self, id: ActivityId) -> Result<Vec<LocationPoint>>;

    async fn set_public(&self, id: ActivityId, is_public: bool) -> Result<()>;

    async fn mark_synced(&self, id: ActivityId) -> Result<()>;

    /// Delete an activity and its route. Returns `false` if it did not exist.
    async fn delete_activity(&self, id: ActivityId) -> Result<bool>;
}

/// User preferences.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn get_settings(&self) -> Result<UserSettings>;

    async fn update_settings(&self, settings: &UserSettings) -> Result<()>;

    /// Body weight used for calorie math.
    async fn current_weight_kg(&self) -> Result<f64> {
        Ok(self.get_settings().await?.weight_kg)
    }
}
