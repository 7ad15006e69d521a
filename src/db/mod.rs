// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend storage layer.
//!
//! Profiles, gallery photos, race winners and the race calendar live in an
//! external REST proxy. Each concern is a trait so the services can run
//! against [`BackendClient`] in production and [`InMemoryBackend`] offline.

pub mod backend;
pub mod memory;

pub use backend::BackendClient;
pub use memory::InMemoryBackend;

use crate::error::AppError;
use crate::models::{NewPhoto, Photo, ProfileRecord, ScheduledRace, WinnerEntry};
use async_trait::async_trait;

/// Proxy resource paths as constants.
pub mod endpoints {
    pub const PROFILES: &str = "profiles";
    pub const PHOTOS: &str = "photos";
    pub const WINNERS: &str = "winners";
    pub const WINNERS_EXISTS: &str = "winners/exists";
    pub const SCHEDULE: &str = "schedule";
}

/// Wallet-keyed member profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Get a profile, `None` if the wallet has none yet.
    async fn get_profile(&self, wallet: &str) -> Result<Option<ProfileRecord>, AppError>;

    /// Create or replace the whole record keyed by its wallet address.
    async fn upsert_profile(&self, profile: &ProfileRecord) -> Result<(), AppError>;

    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, AppError>;
}

/// Community photo gallery.
#[async_trait]
pub trait GalleryStore: Send + Sync {
    async fn upload_photo(&self, photo: &NewPhoto) -> Result<Photo, AppError>;

    async fn list_photos(&self) -> Result<Vec<Photo>, AppError>;

    async fn list_photos_by_wallet(&self, wallet: &str) -> Result<Vec<Photo>, AppError>;

    /// Delete a photo. Returns `false` if it did not exist.
    async fn delete_photo(&self, id: &str) -> Result<bool, AppError>;
}

/// Committed race podiums.
///
/// The backend has no atomic insert-if-absent, so callers check
/// [`WinnerStore::exists_for_race`] before [`WinnerStore::save_winners`].
#[async_trait]
pub trait WinnerStore: Send + Sync {
    async fn save_winners(&self, winners: &[WinnerEntry]) -> Result<(), AppError>;

    async fn exists_for_race(
        &self,
        race_name: &str,
        race_date: &str,
        full_name: &str,
        position: u32,
    ) -> Result<bool, AppError>;

    async fn list_winners(&self) -> Result<Vec<WinnerEntry>, AppError>;

    async fn list_winners_for_race(
        &self,
        race_name: &str,
        race_date: &str,
    ) -> Result<Vec<WinnerEntry>, AppError>;
}

/// Season calendar.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn list_schedule(&self) -> Result<Vec<ScheduledRace>, AppError>;
}
