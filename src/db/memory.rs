// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory backend for offline mode and tests.

use crate::db::{GalleryStore, ProfileStore, ScheduleStore, WinnerStore};
use crate::error::AppError;
use crate::models::winner::dedup_key;
use crate::models::{NewPhoto, Photo, ProfileRecord, ScheduledRace, WinnerEntry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;

/// Backend that keeps every collection in process memory.
///
/// Writes are counted so tests can assert that a code path did (or did not)
/// touch the store. [`InMemoryBackend::set_unreachable`] makes every call
/// fail like a network outage.
#[derive(Default)]
pub struct InMemoryBackend {
    profiles: Mutex<HashMap<String, ProfileRecord>>,
    photos: Mutex<Vec<Photo>>,
    winners: Mutex<Vec<WinnerEntry>>,
    schedule: Mutex<Vec<ScheduledRace>>,
    next_photo_id: AtomicU64,
    profile_writes: AtomicU64,
    winner_batches: AtomicU64,
    unreachable: AtomicBool,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the proxy being down (or back up).
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Number of profile upserts performed.
    pub fn profile_writes(&self) -> u64 {
        self.profile_writes.load(Ordering::SeqCst)
    }

    /// Number of winner batches saved.
    pub fn winner_batches(&self) -> u64 {
        self.winner_batches.load(Ordering::SeqCst)
    }

    /// Replace the race calendar.
    pub async fn set_schedule(&self, races: Vec<ScheduledRace>) {
        *self.schedule.lock().await = races;
    }

    fn check_reachable(&self) -> Result<(), AppError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(AppError::Backend("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for InMemoryBackend {
    async fn get_profile(&self, wallet: &str) -> Result<Option<ProfileRecord>, AppError> {
        self.check_reachable()?;
        Ok(self.profiles.lock().await.get(wallet).cloned())
    }

    async fn upsert_profile(&self, profile: &ProfileRecord) -> Result<(), AppError> {
        self.check_reachable()?;
        self.profiles
            .lock()
            .await
            .insert(profile.wallet_address.clone(), profile.clone());
        self.profile_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, AppError> {
        self.check_reachable()?;
        let mut profiles: Vec<ProfileRecord> =
            self.profiles.lock().await.values().cloned().collect();
        profiles.sort_by(|a, b| a.wallet_address.cmp(&b.wallet_address));
        Ok(profiles)
    }
}

#[async_trait]
impl GalleryStore for InMemoryBackend {
    async fn upload_photo(&self, photo: &NewPhoto) -> Result<Photo, AppError> {
        self.check_reachable()?;
        let id = self.next_photo_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = Photo {
            id: format!("photo-{}", id),
            wallet_address: photo.wallet_address.clone(),
            image_url: photo.image_url.clone(),
            caption: photo.caption.clone(),
            created_at: crate::time_utils::format_utc_rfc3339(chrono::Utc::now()),
        };
        self.photos.lock().await.push(stored.clone());
        Ok(stored)
    }

    async fn list_photos(&self) -> Result<Vec<Photo>, AppError> {
        self.check_reachable()?;
        Ok(self.photos.lock().await.clone())
    }

    async fn list_photos_by_wallet(&self, wallet: &str) -> Result<Vec<Photo>, AppError> {
        self.check_reachable()?;
        Ok(self
            .photos
            .lock()
            .await
            .iter()
            .filter(|p| p.wallet_address == wallet)
            .cloned()
            .collect())
    }

    async fn delete_photo(&self, id: &str) -> Result<bool, AppError> {
        self.check_reachable()?;
        let mut photos = self.photos.lock().await;
        let before = photos.len();
        photos.retain(|p| p.id != id);
        Ok(photos.len() != before)
    }
}

#[async_trait]
impl WinnerStore for InMemoryBackend {
    async fn save_winners(&self, winners: &[WinnerEntry]) -> Result<(), AppError> {
        self.check_reachable()?;
        self.winners.lock().await.extend_from_slice(winners);
        self.winner_batches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn exists_for_race(
        &self,
        race_name: &str,
        race_date: &str,
        full_name: &str,
        position: u32,
    ) -> Result<bool, AppError> {
        self.check_reachable()?;
        let key = dedup_key(race_name, race_date, full_name, position);
        Ok(self
            .winners
            .lock()
            .await
            .iter()
            .any(|w| w.dedup_key() == key))
    }

    async fn list_winners(&self) -> Result<Vec<WinnerEntry>, AppError> {
        self.check_reachable()?;
        Ok(self.winners.lock().await.clone())
    }

    async fn list_winners_for_race(
        &self,
        race_name: &str,
        race_date: &str,
    ) -> Result<Vec<WinnerEntry>, AppError> {
        self.check_reachable()?;
        let race = race_name.trim().to_lowercase();
        Ok(self
            .winners
            .lock()
            .await
            .iter()
            .filter(|w| w.race_name.trim().to_lowercase() == race && w.race_date == race_date)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ScheduleStore for InMemoryBackend {
    async fn list_schedule(&self) -> Result<Vec<ScheduledRace>, AppError> {
        self.check_reachable()?;
        Ok(self.schedule.lock().await.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_blocks_writes() {
        let backend = InMemoryBackend::new();
        backend.set_unreachable(true);

        let profile = ProfileRecord::new("Abc123", "2024-01-01T00:00:00Z");
        assert!(backend.upsert_profile(&profile).await.is_err());
        assert_eq!(backend.profile_writes(), 0);

        backend.set_unreachable(false);
        backend.upsert_profile(&profile).await.unwrap();
        assert_eq!(backend.profile_writes(), 1);
    }

    #[tokio::test]
    async fn test_delete_photo() {
        let backend = InMemoryBackend::new();
        let photo = backend
            .upload_photo(&NewPhoto {
                wallet_address: "Abc123".to_string(),
                image_url: "https://img.example.com/1.jpg".to_string(),
                caption: None,
            })
            .await
            .unwrap();

        assert!(backend.delete_photo(&photo.id).await.unwrap());
        assert!(!backend.delete_photo(&photo.id).await.unwrap());
        assert!(backend.list_photos().await.unwrap().is_empty());
    }
}
