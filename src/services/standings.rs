// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Driver standings and next-race lookups with cache fallback.

use crate::db::ScheduleStore;
use crate::error::AppError;
use crate::models::schedule::next_race;
use crate::models::ScheduledRace;
use crate::services::cache::{keys, LocalCache};
use crate::services::providers::{DriverStanding, ErgastClient};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// Data from a live fetch or, failing that, the local cache.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Fetched<T> {
    Live { data: T },
    Cached { data: T, cached_at: DateTime<Utc> },
}

impl<T> Fetched<T> {
    pub fn data(&self) -> &T {
        match self {
            Fetched::Live { data } | Fetched::Cached { data, .. } => data,
        }
    }
}

pub struct StandingsService {
    ergast: ErgastClient,
    schedule: Arc<dyn ScheduleStore>,
    cache: LocalCache,
}

impl StandingsService {
    pub fn new(ergast: ErgastClient, schedule: Arc<dyn ScheduleStore>, cache: LocalCache) -> Self {
        Self {
            ergast,
            schedule,
            cache,
        }
    }

    pub async fn driver_standings(&self) -> Result<Fetched<Vec<DriverStanding>>, AppError> {
        match self.ergast.driver_standings().await {
            Ok(standings) => {
                self.cache.put(keys::DRIVER_STANDINGS, &standings).await;
                Ok(Fetched::Live { data: standings })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Driver standings fetch failed");
                self.from_cache(keys::DRIVER_STANDINGS, "driver standings")
            }
        }
    }

    /// The next race on the calendar. A season with no races left is
    /// `Live { data: None }`, not a failure.
    pub async fn next_race(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Fetched<Option<ScheduledRace>>, AppError> {
        match self.schedule.list_schedule().await {
            Ok(races) => {
                let upcoming = next_race(&races, now).cloned();
                if let Some(race) = &upcoming {
                    self.cache.put(keys::NEXT_RACE, race).await;
                }
                Ok(Fetched::Live { data: upcoming })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Race schedule fetch failed");
                let cached: Fetched<ScheduledRace> = self.from_cache(keys::NEXT_RACE, "next race")?;
                match cached {
                    // A cached race that has since finished is no longer "next".
                    Fetched::Cached { data, cached_at } if !data.has_finished(now) => {
                        Ok(Fetched::Cached {
                            data: Some(data),
                            cached_at,
                        })
                    }
                    _ => Err(AppError::Unavailable(
                        "next race temporarily unavailable".to_string(),
                    )),
                }
            }
        }
    }

    fn from_cache<T: DeserializeOwned>(&self, key: &str, what: &str) -> Result<Fetched<T>, AppError> {
        match self.cache.get::<T>(key) {
            Some(hit) => Ok(Fetched::Cached {
                data: hit.value,
                cached_at: hit.cached_at,
            }),
            None => Err(AppError::Unavailable(format!(
                "{} temporarily unavailable",
                what
            ))),
        }
    }
}
