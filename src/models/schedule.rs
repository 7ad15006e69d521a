// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Race calendar model.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// Assumed length of a race, used to decide when results are final.
pub const RACE_DURATION_HOURS: i64 = 3;

/// A scheduled Grand Prix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledRace {
    pub race_name: String,
    pub date: NaiveDate,
    /// Start time (UTC); midnight when unknown
    #[serde(default)]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub circuit_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

impl ScheduledRace {
    /// Scheduled start in UTC.
    pub fn start_time(&self) -> DateTime<Utc> {
        self.date
            .and_time(self.time.unwrap_or(NaiveTime::MIN))
            .and_utc()
    }

    /// Scheduled start plus the fixed race duration.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time() + Duration::hours(RACE_DURATION_HOURS)
    }

    pub fn has_finished(&self, now: DateTime<Utc>) -> bool {
        now > self.end_time()
    }

    /// ISO date string used in winner keys.
    pub fn iso_date(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// First race in `races` whose scheduled end is still ahead.
pub fn next_race(races: &[ScheduledRace], now: DateTime<Utc>) -> Option<&ScheduledRace> {
    races
        .iter()
        .filter(|race| !race.has_finished(now))
        .min_by_key(|race| race.start_time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn race(name: &str, date: &str, time: Option<&str>) -> ScheduledRace {
        ScheduledRace {
            race_name: name.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: time.map(|t| NaiveTime::parse_from_str(t, "%H:%M:%S").unwrap()),
            round: None,
            circuit_name: None,
            country: None,
        }
    }

    #[test]
    fn test_finished_after_three_hours() {
        let silverstone = race("British Grand Prix", "2024-07-07", Some("14:00:00"));

        let during = Utc.with_ymd_and_hms(2024, 7, 7, 16, 59, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 7, 7, 17, 0, 1).unwrap();

        assert!(!silverstone.has_finished(during));
        assert!(silverstone.has_finished(after));
    }

    #[test]
    fn test_next_race_skips_finished() {
        let races = vec![
            race("Monaco Grand Prix", "2024-05-26", Some("13:00:00")),
            race("Canadian Grand Prix", "2024-06-09", Some("18:00:00")),
            race("Spanish Grand Prix", "2024-06-23", None),
        ];
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let next = next_race(&races, now).unwrap();
        assert_eq!(next.race_name, "Canadian Grand Prix");

        let late = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(next_race(&races, late).is_none());
    }
}
