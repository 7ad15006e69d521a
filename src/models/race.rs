// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race session, timing and podium models.
//!
//! Every data provider maps its own response shape onto [`RaceResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Number of places on a podium.
pub const PODIUM_SIZE: usize = 3;

/// A timed session within a race weekend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceSession {
    /// Provider-specific session identifier
    pub session_key: u64,
    pub meeting_name: String,
    /// "Practice 1", "Qualifying", "Sprint", "Race", ...
    pub session_name: String,
    pub date_start: DateTime<Utc>,
}

/// One timing sample: a driver's position at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    pub driver_number: u32,
    pub position: u32,
    pub timestamp: DateTime<Utc>,
}

/// Driver metadata for a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRecord {
    pub driver_number: u32,
    pub full_name: String,
    pub team_name: Option<String>,
    pub team_color: Option<String>,
}

/// A podium place in normalized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PodiumEntry {
    pub driver_number: u32,
    pub position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_color: Option<String>,
}

/// Normalized "latest result" shared by all providers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct RaceResult {
    pub meeting_name: String,
    pub session_name: String,
    /// At most [`PODIUM_SIZE`] entries, ordered by position
    pub podium: Vec<PodiumEntry>,
}

/// Keep the most recent sample for each driver.
pub fn latest_positions(records: &[PositionRecord]) -> Vec<PositionRecord> {
    let mut latest: HashMap<u32, &PositionRecord> = HashMap::new();
    for record in records {
        match latest.get(&record.driver_number) {
            Some(existing) if existing.timestamp >= record.timestamp => {}
            _ => {
                latest.insert(record.driver_number, record);
            }
        }
    }
    latest.into_values().cloned().collect()
}

/// Select the podium: the three lowest positions among each driver's latest
/// sample. Fewer than three drivers yields a shorter podium. Equal positions
/// are passed through in driver-number order.
pub fn podium_from_positions(records: &[PositionRecord]) -> Vec<PositionRecord> {
    let mut latest = latest_positions(records);
    latest.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| a.driver_number.cmp(&b.driver_number))
    });
    latest.truncate(PODIUM_SIZE);
    latest
}

/// Join podium positions with driver metadata by driver number.
pub fn join_drivers(podium: &[PositionRecord], drivers: &[DriverRecord]) -> Vec<PodiumEntry> {
    let by_number: HashMap<u32, &DriverRecord> =
        drivers.iter().map(|d| (d.driver_number, d)).collect();

    podium
        .iter()
        .map(|p| {
            let driver = by_number.get(&p.driver_number);
            PodiumEntry {
                driver_number: p.driver_number,
                position: p.position,
                full_name: driver.map(|d| d.full_name.clone()),
                team_name: driver.and_then(|d| d.team_name.clone()),
                team_color: driver.and_then(|d| d.team_color.clone()),
            }
        })
        .collect()
}
