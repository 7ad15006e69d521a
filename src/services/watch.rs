// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-wallet membership watches.
//!
//! When a wallet connects we wait for it to settle, sync once, then keep
//! polling its membership account. A level change triggers another sync.
//! Poll failures go through the [`WatchMachine`], which backs off and
//! eventually gives up.

use crate::services::chain::ChainError;
use crate::services::membership::{MembershipSyncer, SyncOutcome};
use crate::services::subscription::{WatchAction, WatchEvent, WatchMachine, WatchState};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

struct WatchHandle {
    id: u64,
    stop: watch::Sender<bool>,
}

/// Registry of running membership watches, at most one per wallet.
#[derive(Clone)]
pub struct MembershipWatchRegistry {
    syncer: MembershipSyncer,
    poll_interval: Duration,
    settle_delay: Duration,
    watches: Arc<DashMap<String, WatchHandle>>,
    next_id: Arc<AtomicU64>,
}

impl MembershipWatchRegistry {
    pub fn new(syncer: MembershipSyncer, poll_interval: Duration, settle_delay: Duration) -> Self {
        Self {
            syncer,
            poll_interval,
            settle_delay,
            watches: Arc::new(DashMap::new()),
            next_id: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Start watching `wallet`. Returns `false` if a watch is already running.
    pub fn start(&self, wallet: &str) -> bool {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (stop_tx, stop_rx) = watch::channel(false);

        match self.watches.entry(wallet.to_string()) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => {
                slot.insert(WatchHandle { id, stop: stop_tx });
            }
        }

        let registry = self.clone();
        let wallet = wallet.to_string();
        tokio::spawn(async move {
            registry.run(&wallet, stop_rx).await;
            registry.watches.remove_if(&wallet, |_, handle| handle.id == id);
            tracing::debug!(wallet = %wallet, "Membership watch ended");
        });

        true
    }

    /// Stop watching `wallet`. Returns `false` if no watch was running.
    pub fn stop(&self, wallet: &str) -> bool {
        match self.watches.remove(wallet) {
            Some((_, handle)) => {
                let _ = handle.stop.send(true);
                true
            }
            None => false,
        }
    }

    pub fn is_watching(&self, wallet: &str) -> bool {
        self.watches.contains_key(wallet)
    }

    pub fn active_count(&self) -> usize {
        self.watches.len()
    }

    async fn run(&self, wallet: &str, mut stop: watch::Receiver<bool>) {
        // Let the wallet connection settle before the first read.
        if wait_or_stop(self.settle_delay, &mut stop).await {
            return;
        }

        let mut last_level = match self.syncer.sync(wallet).await {
            Ok(SyncOutcome::Synced { level, .. }) => Some(level),
            Ok(SyncOutcome::Skipped { .. }) => None,
            Err(e) => {
                tracing::warn!(wallet, error = %e, "Initial membership sync rejected");
                return;
            }
        };

        let mut machine = WatchMachine::new();
        let mut action = WatchAction::Connect;

        loop {
            let event = match action {
                WatchAction::Stop => break,
                WatchAction::ScheduleRetry(delay) => {
                    if wait_or_stop(delay, &mut stop).await {
                        WatchEvent::Close
                    } else {
                        WatchEvent::TimerFired
                    }
                }
                WatchAction::Connect | WatchAction::None => {
                    if action == WatchAction::None
                        && wait_or_stop(self.poll_interval, &mut stop).await
                    {
                        WatchEvent::Close
                    } else {
                        self.poll(wallet, machine.state(), &mut last_level).await
                    }
                }
            };

            let previous = machine.state();
            action = machine.on_event(event);
            if machine.state() != previous {
                tracing::debug!(wallet, from = ?previous, to = ?machine.state(), "Membership watch transition");
            }
        }
    }

    /// One chain read, mapped onto a watch event.
    async fn poll(&self, wallet: &str, state: WatchState, last_level: &mut Option<u32>) -> WatchEvent {
        match self.syncer.read_chain_membership(wallet).await {
            Ok(membership) => {
                let level = membership.level();
                if *last_level != Some(level) {
                    tracing::info!(wallet, level, previous = ?last_level, "Membership level changed");
                    if let Ok(SyncOutcome::Synced { level, .. }) = self.syncer.sync(wallet).await {
                        *last_level = Some(level);
                    }
                }
                if state == WatchState::Connecting {
                    WatchEvent::Open
                } else {
                    WatchEvent::Message
                }
            }
            Err(ChainError::InvalidAddress(_)) => WatchEvent::Close,
            Err(e) => {
                tracing::warn!(wallet, error = %e, "Membership poll failed");
                WatchEvent::Error
            }
        }
    }
}

/// Sleep for `delay`; returns `true` if a stop was requested first.
async fn wait_or_stop(delay: Duration, stop: &mut watch::Receiver<bool>) -> bool {
    if *stop.borrow() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        // A dropped sender also means stop.
        _ = stop.changed() => true,
    }
}
