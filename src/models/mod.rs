// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod membership;
pub mod photo;
pub mod profile;
pub mod race;
pub mod schedule;
pub mod winner;

pub use membership::{MembershipAccount, TokenLock};
pub use photo::{NewPhoto, Photo};
pub use profile::{MemberSummary, ProfilePatch, ProfileRecord};
pub use race::{DriverRecord, PodiumEntry, PositionRecord, RaceResult, RaceSession};
pub use schedule::ScheduledRace;
pub use winner::WinnerEntry;
