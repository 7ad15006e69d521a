// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenF1 timing API client and the two providers built on it.

use super::{get_json, http_client, ProviderError, RaceResultProvider, RaceSessionFeed};
use crate::models::race::{join_drivers, podium_from_positions};
use crate::models::{DriverRecord, PositionRecord, RaceResult, RaceSession};
use crate::time_utils::parse_utc;
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// Upper bound on sessions checked for timing data per run.
const MAX_SESSIONS_SCANNED: usize = 12;

/// Session selector for session-scoped endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRef {
    Key(u64),
    /// The session upstream currently tags as latest.
    Latest,
}

impl fmt::Display for SessionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionRef::Key(key) => write!(f, "{}", key),
            SessionRef::Latest => f.write_str("latest"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiSession {
    session_key: u64,
    session_name: String,
    date_start: String,
    meeting_key: u64,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    country_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMeeting {
    meeting_key: u64,
    meeting_name: String,
}

#[derive(Debug, Deserialize)]
struct ApiPosition {
    driver_number: u32,
    position: Option<u32>,
    date: String,
}

#[derive(Debug, Deserialize)]
struct ApiDriver {
    driver_number: u32,
    full_name: Option<String>,
    broadcast_name: Option<String>,
    team_name: Option<String>,
    team_colour: Option<String>,
}

/// OpenF1 API client.
#[derive(Clone)]
pub struct OpenF1Client {
    http: reqwest::Client,
    base_url: String,
}

impl OpenF1Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ProviderError> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, resource: &str) -> String {
        format!("{}/{}", self.base_url, resource)
    }

    /// Fetch a list resource; an upstream 404 is an empty list.
    async fn list<T: for<'de> Deserialize<'de>>(
        &self,
        resource: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, ProviderError> {
        match get_json(&self.http, &self.url(resource), query).await {
            Err(ProviderError::NoResults) => Ok(Vec::new()),
            other => other,
        }
    }

    /// Meeting names keyed by meeting key.
    async fn meeting_names(
        &self,
        query: &[(&str, String)],
    ) -> Result<HashMap<u64, String>, ProviderError> {
        let meetings: Vec<ApiMeeting> = self.list("meetings", query).await?;
        Ok(meetings
            .into_iter()
            .map(|m| (m.meeting_key, m.meeting_name))
            .collect())
    }

    /// Attach meeting names to raw sessions. A failed meeting lookup is not
    /// fatal; the session location stands in for the name.
    async fn resolve_sessions(
        &self,
        sessions: Vec<ApiSession>,
        meeting_query: &[(&str, String)],
    ) -> Vec<RaceSession> {
        let names = match self.meeting_names(meeting_query).await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(error = %e, "OpenF1 meeting lookup failed, using locations");
                HashMap::new()
            }
        };

        sessions
            .into_iter()
            .filter_map(|s| {
                let Some(date_start) = parse_utc(&s.date_start) else {
                    tracing::debug!(session_key = s.session_key, date = %s.date_start, "Skipping session with bad date");
                    return None;
                };
                let meeting_name = names
                    .get(&s.meeting_key)
                    .cloned()
                    .or(s.location)
                    .or(s.country_name)
                    .unwrap_or_else(|| format!("Meeting {}", s.meeting_key));
                Some(RaceSession {
                    session_key: s.session_key,
                    meeting_name,
                    session_name: s.session_name,
                    date_start,
                })
            })
            .collect()
    }

    /// All sessions of a season.
    pub async fn sessions_for_year(&self, year: i32) -> Result<Vec<RaceSession>, ProviderError> {
        let query = [("year", year.to_string())];
        let sessions: Vec<ApiSession> = self.list("sessions", &query).await?;
        Ok(self.resolve_sessions(sessions, &query).await)
    }

    /// Race sessions of a season.
    pub async fn race_sessions_for_year(
        &self,
        year: i32,
    ) -> Result<Vec<RaceSession>, ProviderError> {
        let sessions: Vec<ApiSession> = self
            .list(
                "sessions",
                &[("year", year.to_string()), ("session_name", "Race".to_string())],
            )
            .await?;
        Ok(self
            .resolve_sessions(sessions, &[("year", year.to_string())])
            .await)
    }

    /// The session upstream tags as latest.
    pub async fn latest_session(&self) -> Result<Option<RaceSession>, ProviderError> {
        let query = [("session_key", SessionRef::Latest.to_string())];
        let sessions: Vec<ApiSession> = self.list("sessions", &query).await?;
        let meeting_query = [("meeting_key", SessionRef::Latest.to_string())];
        Ok(self
            .resolve_sessions(sessions, &meeting_query)
            .await
            .into_iter()
            .next())
    }

    /// Position samples for a session.
    pub async fn positions_for(
        &self,
        session: SessionRef,
    ) -> Result<Vec<PositionRecord>, ProviderError> {
        let raw: Vec<ApiPosition> = self
            .list("position", &[("session_key", session.to_string())])
            .await?;

        Ok(raw
            .into_iter()
            .filter_map(|p| {
                Some(PositionRecord {
                    driver_number: p.driver_number,
                    position: p.position?,
                    timestamp: parse_utc(&p.date)?,
                })
            })
            .collect())
    }

    /// Driver metadata for a session.
    pub async fn drivers_for(&self, session: SessionRef) -> Result<Vec<DriverRecord>, ProviderError> {
        let raw: Vec<ApiDriver> = self
            .list("drivers", &[("session_key", session.to_string())])
            .await?;

        Ok(raw
            .into_iter()
            .map(|d| DriverRecord {
                driver_number: d.driver_number,
                full_name: d
                    .full_name
                    .or(d.broadcast_name)
                    .unwrap_or_else(|| format!("#{}", d.driver_number)),
                team_name: d.team_name,
                team_color: d.team_colour,
            })
            .collect())
    }

    /// Podium for a session, joined with driver metadata.
    async fn podium_result(
        &self,
        session: &RaceSession,
        session_ref: SessionRef,
        positions: &[PositionRecord],
    ) -> Result<RaceResult, ProviderError> {
        let podium = podium_from_positions(positions);
        let drivers = self.drivers_for(session_ref).await?;

        Ok(RaceResult {
            meeting_name: session.meeting_name.clone(),
            session_name: session.session_name.clone(),
            podium: join_drivers(&podium, &drivers),
        })
    }
}

#[async_trait]
impl RaceSessionFeed for OpenF1Client {
    async fn find_race_session(
        &self,
        race_name: &str,
        date: NaiveDate,
    ) -> Result<Option<RaceSession>, ProviderError> {
        let sessions = self.race_sessions_for_year(date.year()).await?;
        Ok(sessions
            .into_iter()
            .find(|s| is_race_session_for(s, race_name, date)))
    }

    async fn positions(&self, session_key: u64) -> Result<Vec<PositionRecord>, ProviderError> {
        self.positions_for(SessionRef::Key(session_key)).await
    }

    async fn drivers(&self, session_key: u64) -> Result<Vec<DriverRecord>, ProviderError> {
        self.drivers_for(SessionRef::Key(session_key)).await
    }
}

/// Whether `session` is the race of the meeting `race_name` on `date`.
///
/// Names match case-insensitively when either contains the other ("Monaco"
/// vs "Monaco Grand Prix"). Dates may differ by one day to absorb timezone
/// skew between the calendar and the timing feed.
pub fn is_race_session_for(session: &RaceSession, race_name: &str, date: NaiveDate) -> bool {
    if !session.session_name.eq_ignore_ascii_case("Race") {
        return false;
    }

    let wanted = race_name.trim().to_lowercase();
    let have = session.meeting_name.trim().to_lowercase();
    if wanted.is_empty() || !(have.contains(&wanted) || wanted.contains(&have)) {
        return false;
    }

    (session.date_start.date_naive() - date).num_days().abs() <= 1
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider A - newest session with timing data
// ─────────────────────────────────────────────────────────────────────────────

/// Lists the season's sessions and walks them newest-first until one has
/// position data.
pub struct OpenF1SessionsProvider {
    client: OpenF1Client,
}

impl OpenF1SessionsProvider {
    pub fn new(client: OpenF1Client) -> Self {
        Self { client }
    }

    /// Started sessions of the current season, or of last season when the
    /// current one has not started yet.
    async fn started_sessions(&self) -> Result<Vec<RaceSession>, ProviderError> {
        let now = Utc::now();
        let mut sessions = self.client.sessions_for_year(now.year()).await?;
        sessions.retain(|s| s.date_start <= now);

        if sessions.is_empty() {
            sessions = self.client.sessions_for_year(now.year() - 1).await?;
            sessions.retain(|s| s.date_start <= now);
        }

        sessions.sort_by(|a, b| b.date_start.cmp(&a.date_start));
        Ok(sessions)
    }
}

#[async_trait]
impl RaceResultProvider for OpenF1SessionsProvider {
    fn name(&self) -> &'static str {
        "openf1_sessions"
    }

    async fn latest_result(&self) -> Result<RaceResult, ProviderError> {
        let sessions = self.started_sessions().await?;

        for session in sessions.iter().take(MAX_SESSIONS_SCANNED) {
            let session_ref = SessionRef::Key(session.session_key);
            match self.client.positions_for(session_ref).await {
                Ok(positions) if !positions.is_empty() => {
                    tracing::debug!(
                        session_key = session.session_key,
                        meeting = %session.meeting_name,
                        "Found latest session with results"
                    );
                    return self.client.podium_result(session, session_ref, &positions).await;
                }
                Ok(_) => continue,
                // Live sessions are locked; an older one may still have data.
                Err(e) if e.is_expected() => continue,
                Err(e) => return Err(e),
            }
        }

        Err(ProviderError::NoResults)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Provider B - the "latest" session pointer
// ─────────────────────────────────────────────────────────────────────────────

/// Asks directly for the session tagged latest.
pub struct OpenF1LatestProvider {
    client: OpenF1Client,
}

impl OpenF1LatestProvider {
    pub fn new(client: OpenF1Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RaceResultProvider for OpenF1LatestProvider {
    fn name(&self) -> &'static str {
        "openf1_latest"
    }

    async fn latest_result(&self) -> Result<RaceResult, ProviderError> {
        let session = self
            .client
            .latest_session()
            .await?
            .ok_or(ProviderError::NoResults)?;

        let positions = self.client.positions_for(SessionRef::Latest).await?;
        if positions.is_empty() {
            return Err(ProviderError::NoResults);
        }

        self.client
            .podium_result(&session, SessionRef::Latest, &positions)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(meeting: &str, name: &str, y: i32, m: u32, d: u32) -> RaceSession {
        RaceSession {
            session_key: 1,
            meeting_name: meeting.to_string(),
            session_name: name.to_string(),
            date_start: Utc.with_ymd_and_hms(y, m, d, 13, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_race_session_matching() {
        let date = NaiveDate::from_ymd_opt(2024, 5, 26).unwrap();
        let race = session("Monaco Grand Prix", "Race", 2024, 5, 26);

        assert!(is_race_session_for(&race, "Monaco Grand Prix", date));
        assert!(is_race_session_for(&race, "monaco", date));
        assert!(!is_race_session_for(&race, "Canadian Grand Prix", date));
        assert!(!is_race_session_for(
            &session("Monaco Grand Prix", "Qualifying", 2024, 5, 25),
            "Monaco Grand Prix",
            date
        ));
        assert!(!is_race_session_for(
            &session("Monaco Grand Prix", "Race", 2023, 5, 28),
            "Monaco Grand Prix",
            date
        ));
    }

    #[test]
    fn test_session_ref_display() {
        assert_eq!(SessionRef::Key(9158).to_string(), "9158");
        assert_eq!(SessionRef::Latest.to_string(), "latest");
    }
}
