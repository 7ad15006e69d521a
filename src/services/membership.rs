// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Membership level synchronization.
//!
//! Keeps the profile's `membershipLevel` in line with the wallet's on-chain
//! membership account:
//! 1. Derive the wallet's membership account address
//! 2. Read the account (absent means level 0)
//! 3. Read the current profile so other fields are merged, not overwritten
//! 4. Upsert the merged record
//!
//! A chain or backend failure that does not prove the account is absent
//! results in no write at all: the last known good level stays in place.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::ProfileRecord;
use crate::services::chain::{ChainClient, ChainError};
use crate::time_utils::now_rfc3339;
use serde::Serialize;
use std::sync::Arc;

/// What the chain says about a wallet's membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainMembership {
    /// No membership account has been created yet.
    Absent,
    /// Account exists with this level.
    Present { level: u32, active_locks: usize },
}

impl ChainMembership {
    pub fn level(&self) -> u32 {
        match self {
            ChainMembership::Absent => 0,
            ChainMembership::Present { level, .. } => *level,
        }
    }
}

/// Result of one sync invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Profile was written with this level.
    Synced {
        wallet: String,
        level: u32,
        account_exists: bool,
        active_locks: usize,
    },
    /// Real state unknown; nothing was written.
    Skipped { wallet: String, reason: String },
}

impl SyncOutcome {
    pub fn is_synced(&self) -> bool {
        matches!(self, SyncOutcome::Synced { .. })
    }
}

/// Reconciles on-chain membership levels into member profiles.
#[derive(Clone)]
pub struct MembershipSyncer {
    chain: Arc<dyn ChainClient>,
    profiles: Arc<dyn ProfileStore>,
}

impl MembershipSyncer {
    pub fn new(chain: Arc<dyn ChainClient>, profiles: Arc<dyn ProfileStore>) -> Self {
        Self { chain, profiles }
    }

    /// Read the wallet's membership from the chain.
    ///
    /// `Err` means the state is unknown and must not be treated as zero.
    pub async fn read_chain_membership(&self, wallet: &str) -> Result<ChainMembership, ChainError> {
        let address = self.chain.derive_account_address(wallet)?;

        if !self.chain.account_exists(&address).await? {
            return Ok(ChainMembership::Absent);
        }

        match self.chain.fetch_account(&address).await {
            Ok(account) => Ok(ChainMembership::Present {
                level: account.level,
                active_locks: account.active_locks(),
            }),
            // Existence check raced with a closed/reset account.
            Err(e) if e.is_absent() => Ok(ChainMembership::Absent),
            Err(e) => Err(e),
        }
    }

    /// Run one sync for `wallet`.
    ///
    /// Invalid wallet addresses are reported to the caller. Every other
    /// failure is logged and turned into [`SyncOutcome::Skipped`], since sync
    /// is background best-effort work.
    pub async fn sync(&self, wallet: &str) -> Result<SyncOutcome, AppError> {
        let membership = match self.read_chain_membership(wallet).await {
            Ok(m) => m,
            Err(ChainError::InvalidAddress(msg)) => {
                return Err(AppError::BadRequest(format!("Invalid wallet: {}", msg)));
            }
            Err(e) => {
                tracing::warn!(wallet, error = %e, "Chain read failed, keeping last known level");
                return Ok(skipped(wallet, &e));
            }
        };

        let level = membership.level();

        // Fetch before write so we merge into, not over, the stored record.
        let existing = match self.profiles.get_profile(wallet).await {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(wallet, error = %e, "Profile read failed, skipping level write");
                return Ok(skipped(wallet, &e));
            }
        };

        let now = now_rfc3339();
        let record = existing
            .unwrap_or_else(|| ProfileRecord::new(wallet, &now))
            .with_membership_level(level, &now);

        if let Err(e) = self.profiles.upsert_profile(&record).await {
            tracing::warn!(wallet, level, error = %e, "Profile write failed");
            return Ok(skipped(wallet, &e));
        }

        let (account_exists, active_locks) = match membership {
            ChainMembership::Absent => (false, 0),
            ChainMembership::Present { active_locks, .. } => (true, active_locks),
        };

        tracing::info!(wallet, level, account_exists, "Membership level synced");

        Ok(SyncOutcome::Synced {
            wallet: wallet.to_string(),
            level,
            account_exists,
            active_locks,
        })
    }
}

fn skipped(wallet: &str, reason: &dyn std::fmt::Display) -> SyncOutcome {
    SyncOutcome::Skipped {
        wallet: wallet.to_string(),
        reason: reason.to_string(),
    }
}
