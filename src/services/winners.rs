// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race winner persistence.
//!
//! Once a scheduled race is over, its podium is computed from the timing
//! feed and written to the backend. The backend has no insert-if-absent, so
//! each candidate is checked for existence first and only absent entries
//! are saved. A race committed by this instance is remembered in memory so
//! later ticks skip it; a failure anywhere leaves it unmarked for retry.

use crate::db::{ScheduleStore, WinnerStore};
use crate::error::AppError;
use crate::models::race::{join_drivers, podium_from_positions};
use crate::models::{ScheduledRace, WinnerEntry};
use crate::services::providers::RaceSessionFeed;
use chrono::{DateTime, Duration, Utc};
use futures_util::{stream, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Races that ended longer ago than this are no longer checked.
const COMMIT_WINDOW_HOURS: i64 = 72;
/// Concurrent existence checks per race.
const MAX_CONCURRENT_CHECKS: usize = 3;

/// Outcome of one commit attempt for a race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Race has not finished yet.
    NotFinished,
    /// Already committed by this instance.
    AlreadyCommitted,
    /// No race session in the timing feed yet.
    SessionNotFound,
    /// Session found but it has no position data yet.
    NoPositions,
    /// Some podium drivers have no metadata yet, so no full entry can be built.
    MissingDrivers,
    /// Committed; `saved` new entries written, `skipped` already present.
    Committed { saved: usize, skipped: usize },
}

/// Commits finished race podiums to the backend.
pub struct WinnerPersister {
    feed: Arc<dyn RaceSessionFeed>,
    winners: Arc<dyn WinnerStore>,
    /// Keys (`race name|date`) committed by this instance.
    committed: Mutex<HashSet<String>>,
}

impl WinnerPersister {
    pub fn new(feed: Arc<dyn RaceSessionFeed>, winners: Arc<dyn WinnerStore>) -> Self {
        Self {
            feed,
            winners,
            committed: Mutex::new(HashSet::new()),
        }
    }

    fn race_key(race: &ScheduledRace) -> String {
        format!("{}|{}", race.race_name.trim().to_lowercase(), race.iso_date())
    }

    pub async fn is_committed(&self, race: &ScheduledRace) -> bool {
        self.committed.lock().await.contains(&Self::race_key(race))
    }

    /// Try to commit one race's podium.
    pub async fn commit_race(
        &self,
        race: &ScheduledRace,
        now: DateTime<Utc>,
    ) -> Result<CommitOutcome, AppError> {
        if !race.has_finished(now) {
            return Ok(CommitOutcome::NotFinished);
        }
        if self.is_committed(race).await {
            return Ok(CommitOutcome::AlreadyCommitted);
        }

        let Some(session) = self
            .feed
            .find_race_session(&race.race_name, race.date)
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?
        else {
            tracing::debug!(race = %race.race_name, date = %race.date, "No race session in feed yet");
            return Ok(CommitOutcome::SessionNotFound);
        };

        let positions = self
            .feed
            .positions(session.session_key)
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;
        let podium = podium_from_positions(&positions);
        if podium.is_empty() {
            return Ok(CommitOutcome::NoPositions);
        }

        let drivers = self
            .feed
            .drivers(session.session_key)
            .await
            .map_err(|e| AppError::Provider(e.to_string()))?;

        let candidates = build_entries(race, &join_drivers(&podium, &drivers));
        if candidates.len() < podium.len() {
            tracing::debug!(
                race = %race.race_name,
                podium = podium.len(),
                named = candidates.len(),
                "Driver metadata incomplete, retrying later"
            );
            return Ok(CommitOutcome::MissingDrivers);
        }
        let candidate_count = candidates.len();
        let fresh = self.filter_absent(candidates).await?;
        let saved = fresh.len();

        if !fresh.is_empty() {
            self.winners.save_winners(&fresh).await?;
        }

        self.committed.lock().await.insert(Self::race_key(race));
        tracing::info!(
            race = %race.race_name,
            date = %race.date,
            saved,
            skipped = candidate_count - saved,
            "Race winners committed"
        );

        Ok(CommitOutcome::Committed {
            saved,
            skipped: candidate_count - saved,
        })
    }

    /// Keep only entries the backend does not have yet. Duplicate keys within
    /// the batch are dropped too.
    async fn filter_absent(
        &self,
        candidates: Vec<WinnerEntry>,
    ) -> Result<Vec<WinnerEntry>, AppError> {
        let mut seen = HashSet::new();
        let unique: Vec<WinnerEntry> = candidates
            .into_iter()
            .filter(|entry| seen.insert(entry.dedup_key()))
            .collect();

        let winners = &self.winners;
        let checked: Vec<Result<Option<WinnerEntry>, AppError>> = stream::iter(unique)
            .map(|entry| async move {
                let exists = winners
                    .exists_for_race(
                        &entry.race_name,
                        &entry.race_date,
                        &entry.full_name,
                        entry.position,
                    )
                    .await?;
                Ok::<_, AppError>((!exists).then_some(entry))
            })
            .buffered(MAX_CONCURRENT_CHECKS)
            .collect()
            .await;

        let mut fresh = Vec::new();
        for result in checked {
            if let Some(entry) = result? {
                fresh.push(entry);
            }
        }
        Ok(fresh)
    }

    /// One scheduler tick: try every recently finished, uncommitted race.
    pub async fn tick(&self, schedule: &dyn ScheduleStore, now: DateTime<Utc>) {
        let races = match schedule.list_schedule().await {
            Ok(races) => races,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot load race schedule");
                return;
            }
        };

        let window = Duration::hours(COMMIT_WINDOW_HOURS);
        for race in races
            .iter()
            .filter(|race| race.has_finished(now) && now - race.end_time() <= window)
        {
            if let Err(e) = self.commit_race(race, now).await {
                tracing::warn!(race = %race.race_name, error = %e, "Winner commit failed, will retry");
            }
        }
    }

    /// Tick every `period` until the task is dropped.
    pub async fn run(self: Arc<Self>, schedule: Arc<dyn ScheduleStore>, period: std::time::Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.tick(schedule.as_ref(), Utc::now()).await;
        }
    }
}

/// Build winner records. Podium places without a known driver name are
/// left out since the name is part of the dedup key; callers treat a short
/// result as not ready.
fn build_entries(race: &ScheduledRace, podium: &[crate::models::PodiumEntry]) -> Vec<WinnerEntry> {
    podium
        .iter()
        .filter_map(|place| {
            let full_name = place.full_name.clone()?;
            Some(WinnerEntry {
                position: place.position,
                driver_number: place.driver_number,
                full_name,
                team_name: place.team_name.clone(),
                team_color: place.team_color.clone(),
                race_name: race.race_name.clone(),
                race_date: race.iso_date(),
            })
        })
        .collect()
}
