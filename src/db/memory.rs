// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store backed by concurrent maps.
//!
//! Provides:
//! - Activities (auto-increment ids, newest-first listing)
//! - Location points (append-only per activity, cascade on delete)
//! - Settings (single row)

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::db::{ActivityStore, SettingsStore};
use crate::error::{AppError, Result};
use crate::models::{
    Activity, ActivityId, ActivitySummary, ActivityType, LocationPoint, UserSettings,
};

/// In-memory activity and settings store.
pub struct MemoryStore {
    next_id: AtomicI64,
    activities: DashMap<ActivityId, Activity>,
    location_points: DashMap<ActivityId, Vec<LocationPoint>>,
    settings: RwLock<UserSettings>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(UserSettings::default())
    }
}

impl MemoryStore {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            next_id: AtomicI64::new(1),
            activities: DashMap::new(),
            location_points: DashMap::new(),
            settings: RwLock::new(settings),
        }
    }

    fn not_found(id: ActivityId) -> AppError {
        AppError::NotFound(format!("Activity {} not found", id))
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn create_draft(
        &self,
        activity_type: ActivityType,
        start_time: i64,
    ) -> Result<ActivityId> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.activities
            .insert(id, Activity::draft(id, activity_type, start_time));
        tracing::debug!(activity_id = id, activity_type = %activity_type, "Draft activity created");
        Ok(id)
    }

    async fn finalize(&self, id: ActivityId, summary: &ActivitySummary) -> Result<()> {
        let mut activity = self
            .activities
            .get_mut(&id)
            .ok_or_else(|| Self::not_found(id))?;
        activity.apply_summary(summary);
        Ok(())
    }

    async fn append_location_points(
        &self,
        id: ActivityId,
        points: &[LocationPoint],
    ) -> Result<()> {
        if !self.activities.contains_key(&id) {
            return Err(Self::not_found(id));
        }
        self.location_points
            .entry(id)
            .or_default()
            .extend_from_slice(points);
        Ok(())
    }

    async fn get_activity(&self, id: ActivityId) -> Result<Option<Activity>> {
        Ok(self.activities.get(&id).map(|a| a.clone()))
    }

    async fn list_activities(&self) -> Result<Vec<Activity>> {
        let mut activities: Vec<Activity> =
            self.activities.iter().map(|a| a.value().clone()).collect();
        activities.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(b.id.cmp(&a.id)));
        Ok(activities)
    }

    async fn get_location_points(&self, id: ActivityId) -> Result<Vec<LocationPoint>> {
        Ok(self
            .location_points
            .get(&id)
            .map(|p| p.clone())
            .unwrap_or_default())
    }

    async fn set_public(&self, id: ActivityId, is_public: bool) -> Result<()> {
        let mut activity = self
            .activities
            .get_mut(&id)
            .ok_or_else(|| Self::not_found(id))?;
        activity.is_public = is_public;
        Ok(())
    }

    async fn mark_synced(&self, id: ActivityId) -> Result<()> {
        let mut activity = self
            .activities
            .get_mut(&id)
            .ok_or_else(|| Self::not_found(id))?;
        activity.is_synced = true;
        Ok(())
    }

    async fn delete_activity(&self, id: ActivityId) -> Result<bool> {
        self.location_points.remove(&id);
        Ok(self.activities.remove(&id).is_some())
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn get_settings(&self) -> Result<UserSettings> {
        self.settings
            .read()
            .map(|s| s.clone())
            .map_err(|_| AppError::Storage("Settings lock poisoned".to_string()))
    }

    async fn update_settings(&self, settings: &UserSettings) -> Result<()> {
        let mut guard = self
            .settings
            .write()
            .map_err(|_| AppError::Storage("Settings lock poisoned".to_string()))?;
        *guard = settings.clone();
        Ok(())
    }
}
