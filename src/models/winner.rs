// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race winner records committed to the backend.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// A podium finisher for a completed race. Written at most once per
/// [`WinnerEntry::dedup_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct WinnerEntry {
    pub position: u32,
    pub driver_number: u32,
    pub full_name: String,
    pub team_name: Option<String>,
    pub team_color: Option<String>,
    pub race_name: String,
    /// ISO date (YYYY-MM-DD)
    pub race_date: String,
}

impl WinnerEntry {
    /// Normalized key: `race name|ISO date|driver name|position`, lowercase.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.race_name, &self.race_date, &self.full_name, self.position)
    }
}

/// Build a normalized winner key from its parts.
pub fn dedup_key(race_name: &str, race_date: &str, full_name: &str, position: u32) -> String {
    format!(
        "{}|{}|{}|{}",
        normalize(race_name),
        iso_date(race_date),
        normalize(full_name),
        position
    )
}

fn normalize(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Reduce a date or timestamp to its `YYYY-MM-DD` prefix.
fn iso_date(value: &str) -> &str {
    let trimmed = value.trim();
    trimmed.get(..10).unwrap_or(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, race: &str, date: &str) -> WinnerEntry {
        WinnerEntry {
            position: 1,
            driver_number: 4,
            full_name: name.to_string(),
            team_name: Some("McLaren".to_string()),
            team_color: None,
            race_name: race.to_string(),
            race_date: date.to_string(),
        }
    }

    #[test]
    fn test_dedup_key_is_normalized() {
        let a = entry("Lando Norris", "Monaco Grand Prix", "2024-05-26");
        let b = entry("  LANDO   norris ", "monaco grand prix", "2024-05-26T13:00:00Z");

        assert_eq!(a.dedup_key(), "monaco grand prix|2024-05-26|lando norris|1");
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn test_dedup_key_distinguishes_position() {
        let mut a = entry("Lando Norris", "Monaco Grand Prix", "2024-05-26");
        let first = a.dedup_key();
        a.position = 2;
        assert_ne!(first, a.dedup_key());
    }
}
