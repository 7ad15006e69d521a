// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race data providers.
//!
//! Three independent public APIs, each with its own response shape, all
//! normalized to [`RaceResult`]:
//! - [`OpenF1SessionsProvider`]: scan sessions newest-first for timing data
//! - [`OpenF1LatestProvider`]: ask for the session tagged "latest"
//! - [`ErgastResultsProvider`]: final classification of the last finished race

pub mod ergast;
pub mod openf1;

pub use ergast::{DriverStanding, ErgastClient, ErgastResultsProvider};
pub use openf1::{OpenF1Client, OpenF1LatestProvider, OpenF1SessionsProvider, SessionRef};

use crate::models::{DriverRecord, PositionRecord, RaceResult, RaceSession};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Provider failures. Every variant means "try the next provider".
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Upstream refused access, e.g. while a session is live.
    #[error("Access restricted: {0}")]
    Restricted(String),

    #[error("No results available")]
    NoResults,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("HTTP {0}: {1}")]
    Status(u16, String),

    #[error("Decode error: {0}")]
    Decode(String),
}

impl ProviderError {
    /// Restricted and empty responses are normal states, not faults.
    pub fn is_expected(&self) -> bool {
        matches!(self, ProviderError::Restricted(_) | ProviderError::NoResults)
    }
}

/// A source of "latest result" podium data.
#[async_trait]
pub trait RaceResultProvider: Send + Sync {
    /// Short name used in logs and API responses.
    fn name(&self) -> &'static str;

    async fn latest_result(&self) -> Result<RaceResult, ProviderError>;
}

/// Session-scoped timing lookups used when committing race winners.
#[async_trait]
pub trait RaceSessionFeed: Send + Sync {
    /// Find the "Race" session of the meeting named `race_name` held on `date`.
    async fn find_race_session(
        &self,
        race_name: &str,
        date: NaiveDate,
    ) -> Result<Option<RaceSession>, ProviderError>;

    async fn positions(&self, session_key: u64) -> Result<Vec<PositionRecord>, ProviderError>;

    async fn drivers(&self, session_key: u64) -> Result<Vec<DriverRecord>, ProviderError>;
}

/// Build an HTTP client with the per-call timeout applied.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ProviderError::Transport(e.to_string()))
}

/// GET a JSON document, mapping upstream `{"detail": ...}` bodies to
/// [`ProviderError::Restricted`] and 404s to [`ProviderError::NoResults`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<T, ProviderError> {
    let response = http
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(|e| ProviderError::Transport(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::Transport(e.to_string()))?;

    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(ProviderError::NoResults);
    }

    let value: serde_json::Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(_) if !status.is_success() => {
            return Err(ProviderError::Status(status.as_u16(), body));
        }
        Err(e) => return Err(ProviderError::Decode(format!("JSON parse error: {}", e))),
    };

    if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
        return Err(ProviderError::Restricted(detail.to_string()));
    }

    if !status.is_success() {
        return Err(ProviderError::Status(status.as_u16(), body));
    }

    serde_json::from_value(value).map_err(|e| ProviderError::Decode(e.to_string()))
}
