// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Paddock-Sync: membership and race data backend for an F1 fan community
//!
//! This crate keeps member profiles in line with on-chain membership
//! accounts and resolves race results from several public data providers,
//! serving both over a small JSON API.

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::{GalleryStore, ProfileStore, ScheduleStore, WinnerStore};
use services::{
    MembershipSyncer, MembershipWatchRegistry, RaceResultService, StandingsService,
    WinnerPersister,
};
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub profiles: Arc<dyn ProfileStore>,
    pub gallery: Arc<dyn GalleryStore>,
    pub winners: Arc<dyn WinnerStore>,
    pub schedule: Arc<dyn ScheduleStore>,
    pub membership: MembershipSyncer,
    pub watches: MembershipWatchRegistry,
    pub race_results: Arc<RaceResultService>,
    pub standings: StandingsService,
    pub winner_persister: Arc<WinnerPersister>,
}
