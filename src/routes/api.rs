// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Community API routes: member directory, profiles, gallery and winners.

use crate::error::{AppError, Result};
use crate::models::{MemberSummary, NewPhoto, Photo, ProfilePatch, ProfileRecord, WinnerEntry};
use crate::services::chain::is_valid_address;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/profiles", get(list_profiles))
        .route("/api/profiles/{wallet}", get(get_profile).put(update_profile))
        .route("/api/gallery", get(list_photos).post(upload_photo))
        .route("/api/gallery/{id}", delete(delete_photo))
        .route("/api/winners", get(list_winners))
}

fn check_wallet(wallet: &str) -> Result<()> {
    if is_valid_address(wallet) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid wallet address: {}", wallet)))
    }
}

// ─── Profiles ────────────────────────────────────────────────

/// Community directory, highest membership level first.
async fn list_profiles(State(state): State<Arc<AppState>>) -> Result<Json<Vec<MemberSummary>>> {
    let mut members: Vec<MemberSummary> = state
        .profiles
        .list_profiles()
        .await?
        .into_iter()
        .map(MemberSummary::from)
        .collect();

    members.sort_by(|a, b| {
        b.membership_level
            .cmp(&a.membership_level)
            .then_with(|| a.wallet_address.cmp(&b.wallet_address))
    });

    Ok(Json(members))
}

async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
) -> Result<Json<ProfileRecord>> {
    check_wallet(&wallet)?;

    let profile = state
        .profiles
        .get_profile(&wallet)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Profile {} not found", wallet)))?;

    Ok(Json(profile))
}

/// Merge a partial update into the stored profile.
///
/// Fetch-modify-write so fields missing from the patch (including the
/// membership level and any fields unknown to us) survive.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
    Json(patch): Json<ProfilePatch>,
) -> Result<Json<ProfileRecord>> {
    check_wallet(&wallet)?;
    patch.validate()?;

    let now = now_rfc3339();
    let record = state
        .profiles
        .get_profile(&wallet)
        .await?
        .unwrap_or_else(|| ProfileRecord::new(&wallet, &now))
        .apply(patch, &now);

    state.profiles.upsert_profile(&record).await?;
    tracing::info!(wallet = %wallet, "Profile updated");

    Ok(Json(record))
}

// ─── Gallery ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct GalleryQuery {
    /// Only photos uploaded by this wallet
    wallet: Option<String>,
}

async fn list_photos(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GalleryQuery>,
) -> Result<Json<Vec<Photo>>> {
    let photos = match query.wallet.as_deref() {
        Some(wallet) => state.gallery.list_photos_by_wallet(wallet).await?,
        None => state.gallery.list_photos().await?,
    };
    Ok(Json(photos))
}

async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Json(photo): Json<NewPhoto>,
) -> Result<(StatusCode, Json<Photo>)> {
    photo.validate()?;
    check_wallet(&photo.wallet_address)?;

    let stored = state.gallery.upload_photo(&photo).await?;
    tracing::info!(wallet = %stored.wallet_address, id = %stored.id, "Photo added to gallery");

    Ok((StatusCode::CREATED, Json(stored)))
}

async fn delete_photo(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.gallery.delete_photo(&id).await? {
        tracing::info!(id = %id, "Photo deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!("Photo {} not found", id)))
    }
}

// ─── Winners ─────────────────────────────────────────────────

#[derive(Deserialize)]
struct WinnersQuery {
    race: Option<String>,
    /// ISO date (YYYY-MM-DD)
    date: Option<String>,
}

async fn list_winners(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WinnersQuery>,
) -> Result<Json<Vec<WinnerEntry>>> {
    let winners = match (query.race.as_deref(), query.date.as_deref()) {
        (Some(race), Some(date)) => state.winners.list_winners_for_race(race, date).await?,
        (None, None) => state.winners.list_winners().await?,
        _ => {
            return Err(AppError::BadRequest(
                "race and date must be given together".to_string(),
            ))
        }
    };
    Ok(Json(winners))
}
