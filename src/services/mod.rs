// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod cache;
pub mod chain;
pub mod membership;
pub mod providers;
pub mod race_results;
pub mod standings;
pub mod subscription;
pub mod watch;
pub mod winners;

pub use cache::LocalCache;
pub use chain::{ChainClient, ChainError, SolanaRpcClient};
pub use membership::{ChainMembership, MembershipSyncer, SyncOutcome};
pub use race_results::{PublishedResult, RaceResultResolver, RaceResultService, Resolution};
pub use standings::{Fetched, StandingsService};
pub use watch::MembershipWatchRegistry;
pub use winners::{CommitOutcome, WinnerPersister};
