// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Ergast-compatible historical results client.
//!
//! Lowest-fidelity provider: final classifications only, no team colours.
//! Also serves the season calendar and driver standings.

use super::{get_json, http_client, ProviderError, RaceResultProvider};
use crate::db::ScheduleStore;
use crate::error::AppError;
use crate::models::race::PODIUM_SIZE;
use crate::models::{PodiumEntry, RaceResult, ScheduledRace};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "MRData")]
    data: T,
}

#[derive(Debug, Deserialize)]
struct RaceTableData {
    #[serde(rename = "RaceTable")]
    race_table: RaceTable,
}

#[derive(Debug, Deserialize)]
struct RaceTable {
    #[serde(rename = "Races", default)]
    races: Vec<ApiRace>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiRace {
    round: String,
    race_name: String,
    date: String,
    #[serde(default)]
    time: Option<String>,
    #[serde(rename = "Circuit", default)]
    circuit: Option<ApiCircuit>,
    #[serde(rename = "Results", default)]
    results: Vec<ApiResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCircuit {
    circuit_name: String,
    #[serde(rename = "Location", default)]
    location: Option<ApiLocation>,
}

#[derive(Debug, Deserialize)]
struct ApiLocation {
    #[serde(default)]
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResult {
    #[serde(default)]
    number: String,
    position: String,
    #[serde(rename = "Driver")]
    driver: ApiDriver,
    #[serde(rename = "Constructor", default)]
    constructor: Option<ApiConstructor>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiDriver {
    given_name: String,
    family_name: String,
    #[serde(default)]
    permanent_number: Option<String>,
}

impl ApiDriver {
    fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.family_name)
    }
}

impl ApiResult {
    /// Car number in this race, else the driver's permanent number.
    fn driver_number(&self) -> Option<u32> {
        self.number.parse().ok().or_else(|| {
            self.driver
                .permanent_number
                .as_deref()
                .and_then(|n| n.parse().ok())
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiConstructor {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StandingsData {
    #[serde(rename = "StandingsTable")]
    standings_table: StandingsTable,
}

#[derive(Debug, Deserialize)]
struct StandingsTable {
    #[serde(rename = "StandingsLists", default)]
    lists: Vec<StandingsList>,
}

#[derive(Debug, Deserialize)]
struct StandingsList {
    #[serde(rename = "DriverStandings", default)]
    driver_standings: Vec<ApiDriverStanding>,
}

#[derive(Debug, Deserialize)]
struct ApiDriverStanding {
    position: Option<String>,
    points: String,
    wins: String,
    #[serde(rename = "Driver")]
    driver: ApiDriver,
    #[serde(rename = "Constructors", default)]
    constructors: Vec<ApiConstructor>,
}

/// A row of the drivers' championship.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStanding {
    pub position: Option<u32>,
    pub full_name: String,
    pub driver_number: Option<u32>,
    pub team_name: Option<String>,
    pub points: f64,
    pub wins: u32,
}

impl ApiRace {
    fn to_scheduled(&self) -> Option<ScheduledRace> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        let time = self
            .time
            .as_deref()
            .and_then(|t| NaiveTime::parse_from_str(t.trim_end_matches('Z'), "%H:%M:%S").ok());

        Some(ScheduledRace {
            race_name: self.race_name.clone(),
            date,
            time,
            round: self.round.parse().ok(),
            circuit_name: self.circuit.as_ref().map(|c| c.circuit_name.clone()),
            country: self
                .circuit
                .as_ref()
                .and_then(|c| c.location.as_ref())
                .and_then(|l| l.country.clone()),
        })
    }
}

/// Ergast-compatible API client.
#[derive(Clone)]
pub struct ErgastClient {
    http: reqwest::Client,
    base_url: String,
}

impl ErgastClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn races(&self, path: &str) -> Result<Vec<ApiRace>, ProviderError> {
        let url = format!("{}/{}", self.base_url, path);
        let envelope: Envelope<RaceTableData> = get_json(&self.http, &url, &[]).await?;
        Ok(envelope.data.race_table.races)
    }

    /// The current season's calendar.
    pub async fn season_schedule(&self) -> Result<Vec<ScheduledRace>, ProviderError> {
        Ok(self
            .races("current.json")
            .await?
            .iter()
            .filter_map(ApiRace::to_scheduled)
            .collect())
    }

    /// Current drivers' championship standings.
    pub async fn driver_standings(&self) -> Result<Vec<DriverStanding>, ProviderError> {
        let url = format!("{}/current/driverStandings.json", self.base_url);
        let envelope: Envelope<StandingsData> = get_json(&self.http, &url, &[]).await?;

        let list = envelope
            .data
            .standings_table
            .lists
            .into_iter()
            .next()
            .ok_or(ProviderError::NoResults)?;

        Ok(list
            .driver_standings
            .into_iter()
            .map(|s| DriverStanding {
                position: s.position.as_deref().and_then(|p| p.parse().ok()),
                full_name: s.driver.full_name(),
                driver_number: s
                    .driver
                    .permanent_number
                    .as_deref()
                    .and_then(|n| n.parse().ok()),
                team_name: s.constructors.into_iter().next().map(|c| c.name),
                points: s.points.parse().unwrap_or(0.0),
                wins: s.wins.parse().unwrap_or(0),
            })
            .collect())
    }

    /// Most recent race whose scheduled end is before `now`.
    pub async fn last_finished_race(
        &self,
        now: DateTime<Utc>,
    ) -> Result<ScheduledRace, ProviderError> {
        let schedule = self.season_schedule().await?;
        schedule
            .into_iter()
            .rev()
            .find(|race| race.has_finished(now))
            .ok_or(ProviderError::NoResults)
    }

    /// Final classification podium of a round.
    pub async fn race_podium(&self, round: u32) -> Result<RaceResult, ProviderError> {
        let race = self
            .races(&format!("current/{}/results.json", round))
            .await?
            .into_iter()
            .next()
            .ok_or(ProviderError::NoResults)?;

        let mut results: Vec<(u32, &ApiResult)> = race
            .results
            .iter()
            .filter_map(|r| r.position.parse::<u32>().ok().map(|p| (p, r)))
            .collect();
        results.sort_by_key(|(position, _)| *position);

        let podium: Vec<PodiumEntry> = results
            .into_iter()
            .take(PODIUM_SIZE)
            .filter_map(|(position, r)| {
                let Some(driver_number) = r.driver_number() else {
                    tracing::warn!(position, driver = %r.driver.full_name(), "Result without a driver number");
                    return None;
                };
                Some(PodiumEntry {
                    driver_number,
                    position,
                    full_name: Some(r.driver.full_name()),
                    team_name: r.constructor.as_ref().map(|c| c.name.clone()),
                    team_color: None,
                })
            })
            .collect();

        if podium.is_empty() {
            return Err(ProviderError::NoResults);
        }

        Ok(RaceResult {
            meeting_name: race.race_name,
            session_name: "Race".to_string(),
            podium,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider C - historical results
// ─────────────────────────────────────────────────────────────────────────────

/// Finds the last finished race on the calendar and reads its classification.
pub struct ErgastResultsProvider {
    client: ErgastClient,
}

impl ErgastResultsProvider {
    pub fn new(client: ErgastClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RaceResultProvider for ErgastResultsProvider {
    fn name(&self) -> &'static str {
        "ergast_results"
    }

    async fn latest_result(&self) -> Result<RaceResult, ProviderError> {
        let race = self.client.last_finished_race(Utc::now()).await?;
        let round = race.round.ok_or_else(|| {
            ProviderError::Decode(format!("race {} has no round number", race.race_name))
        })?;
        self.client.race_podium(round).await
    }
}

/// The public calendar doubles as the schedule source when no backend proxy
/// is configured.
#[async_trait]
impl ScheduleStore for ErgastClient {
    async fn list_schedule(&self) -> Result<Vec<ScheduledRace>, AppError> {
        self.season_schedule()
            .await
            .map_err(|e| AppError::Provider(e.to_string()))
    }
}
