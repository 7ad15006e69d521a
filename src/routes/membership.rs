// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Membership sync triggers.

use crate::error::{AppError, Result};
use crate::services::chain::is_valid_address;
use crate::services::SyncOutcome;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/membership/{wallet}/sync", post(sync_now))
        .route(
            "/api/membership/{wallet}/connect",
            post(connect).delete(disconnect),
        )
}

#[derive(Serialize)]
pub struct WatchResponse {
    pub wallet: String,
    pub watching: bool,
    /// Whether this call changed the watch state
    pub changed: bool,
}

/// Sync immediately, e.g. right after a lock or unlock transaction.
async fn sync_now(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
) -> Result<Json<SyncOutcome>> {
    let outcome = state.membership.sync(&wallet).await?;
    Ok(Json(outcome))
}

/// Wallet connected: sync after the settle delay, then keep watching.
async fn connect(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
) -> Result<(StatusCode, Json<WatchResponse>)> {
    if !is_valid_address(&wallet) {
        return Err(AppError::BadRequest(format!(
            "Invalid wallet address: {}",
            wallet
        )));
    }

    let started = state.watches.start(&wallet);
    if started {
        tracing::info!(wallet = %wallet, "Membership watch started");
    }

    Ok((
        StatusCode::ACCEPTED,
        Json(WatchResponse {
            wallet,
            watching: true,
            changed: started,
        }),
    ))
}

async fn disconnect(
    State(state): State<Arc<AppState>>,
    Path(wallet): Path<String>,
) -> Json<WatchResponse> {
    let stopped = state.watches.stop(&wallet);
    if stopped {
        tracing::info!(wallet = %wallet, "Membership watch stopped");
    }

    Json(WatchResponse {
        wallet,
        watching: false,
        changed: stopped,
    })
}
