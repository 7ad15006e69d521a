// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race data routes: latest result, standings, next race.

use crate::error::{AppError, Result};
use crate::models::ScheduledRace;
use crate::services::providers::DriverStanding;
use crate::services::{Fetched, PublishedResult, Resolution};
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/race/latest", get(latest_result))
        .route("/api/standings", get(standings))
        .route("/api/schedule/next", get(next_race))
}

/// Latest published race result. Before the first refresh has published
/// anything, resolve once inline.
async fn latest_result(State(state): State<Arc<AppState>>) -> Result<Json<PublishedResult>> {
    let published = match state.race_results.latest().await {
        Some(published) => published,
        None => {
            state.race_results.refresh().await;
            state
                .race_results
                .latest()
                .await
                .ok_or_else(|| AppError::Unavailable("race results".to_string()))?
        }
    };

    if published.resolution == Resolution::Unavailable {
        return Err(AppError::Unavailable(
            "race results temporarily unavailable".to_string(),
        ));
    }

    Ok(Json(published))
}

async fn standings(State(state): State<Arc<AppState>>) -> Result<Json<Fetched<Vec<DriverStanding>>>> {
    Ok(Json(state.standings.driver_standings().await?))
}

async fn next_race(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Fetched<Option<ScheduledRace>>>> {
    Ok(Json(state.standings.next_race(chrono::Utc::now()).await?))
}
