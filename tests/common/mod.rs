// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use paddock_sync::config::Config;
use paddock_sync::db::InMemoryBackend;
use paddock_sync::models::{
    DriverRecord, MembershipAccount, PodiumEntry, PositionRecord, RaceResult, RaceSession,
    TokenLock,
};
use paddock_sync::routes::create_router;
use paddock_sync::services::chain::{ChainClient, ChainError};
use paddock_sync::services::providers::openf1::is_race_session_for;
use paddock_sync::services::providers::{
    ErgastClient, ProviderError, RaceResultProvider, RaceSessionFeed,
};
use paddock_sync::services::{
    LocalCache, MembershipSyncer, MembershipWatchRegistry, RaceResultResolver, RaceResultService,
    StandingsService, WinnerPersister,
};
use paddock_sync::AppState;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ─── Fake chain ──────────────────────────────────────────────

/// What the fake chain answers for a wallet.
#[allow(dead_code)]
#[derive(Clone)]
pub enum ChainState {
    /// No membership account yet.
    Missing,
    Account(MembershipAccount),
    /// RPC node unreachable.
    Down,
    /// Account exists but its data cannot be decoded.
    Garbled,
}

/// Chain client answering from an in-memory table. Accepts any non-empty
/// wallet string.
pub struct FakeChain {
    wallets: Mutex<HashMap<String, ChainState>>,
    reads: AtomicUsize,
}

#[allow(dead_code)]
impl FakeChain {
    pub fn new() -> Self {
        Self {
            wallets: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, wallet: &str, state: ChainState) {
        self.wallets
            .lock()
            .unwrap()
            .insert(wallet.to_string(), state);
    }

    pub fn set_level(&self, wallet: &str, level: u32) {
        self.set(wallet, ChainState::Account(account(wallet, level, vec![])));
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn state_for(&self, address: &str) -> ChainState {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let wallet = address.trim_start_matches("membership:");
        self.wallets
            .lock()
            .unwrap()
            .get(wallet)
            .cloned()
            .unwrap_or(ChainState::Missing)
    }
}

#[async_trait]
impl ChainClient for FakeChain {
    fn derive_account_address(&self, wallet: &str) -> Result<String, ChainError> {
        if wallet.trim().is_empty() {
            return Err(ChainError::InvalidAddress("empty wallet".to_string()));
        }
        Ok(format!("membership:{}", wallet))
    }

    async fn account_exists(&self, address: &str) -> Result<bool, ChainError> {
        match self.state_for(address) {
            ChainState::Missing => Ok(false),
            ChainState::Down => Err(ChainError::Transport("connection refused".to_string())),
            ChainState::Account(_) | ChainState::Garbled => Ok(true),
        }
    }

    async fn fetch_account(&self, address: &str) -> Result<MembershipAccount, ChainError> {
        match self.state_for(address) {
            ChainState::Missing => Err(ChainError::AccountNotFound(address.to_string())),
            ChainState::Down => Err(ChainError::Transport("connection refused".to_string())),
            ChainState::Garbled => Err(ChainError::Decode("account data truncated".to_string())),
            ChainState::Account(account) => Ok(account),
        }
    }
}

#[allow(dead_code)]
pub fn account(owner: &str, level: u32, locks: Vec<TokenLock>) -> MembershipAccount {
    MembershipAccount {
        owner: owner.to_string(),
        level,
        locks,
    }
}

/// A syntactically valid base58 wallet address.
#[allow(dead_code)]
pub fn wallet(fill: u8) -> String {
    bs58::encode([fill; 32]).into_string()
}

// ─── Fake providers ──────────────────────────────────────────

/// What a fake provider returns on its next call.
#[allow(dead_code)]
#[derive(Clone)]
pub enum ProviderReply {
    Result(RaceResult),
    Restricted,
    NoResults,
    Down,
}

pub struct FakeProvider {
    name: &'static str,
    reply: Mutex<ProviderReply>,
    calls: AtomicUsize,
}

#[allow(dead_code)]
impl FakeProvider {
    pub fn new(name: &'static str, reply: ProviderReply) -> Arc<Self> {
        Arc::new(Self {
            name,
            reply: Mutex::new(reply),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn set_reply(&self, reply: ProviderReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RaceResultProvider for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn latest_result(&self) -> Result<RaceResult, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            ProviderReply::Result(result) => Ok(result),
            ProviderReply::Restricted => {
                Err(ProviderError::Restricted("Session in progress".to_string()))
            }
            ProviderReply::NoResults => Err(ProviderError::NoResults),
            ProviderReply::Down => Err(ProviderError::Transport("connection reset".to_string())),
        }
    }
}

/// Race result whose podium lists `drivers` in finishing order.
#[allow(dead_code)]
pub fn race_result(meeting: &str, drivers: &[(u32, &str, Option<&str>)]) -> RaceResult {
    RaceResult {
        meeting_name: meeting.to_string(),
        session_name: "Race".to_string(),
        podium: drivers
            .iter()
            .enumerate()
            .map(|(i, (number, name, color))| PodiumEntry {
                driver_number: *number,
                position: i as u32 + 1,
                full_name: Some(name.to_string()),
                team_name: None,
                team_color: color.map(str::to_string),
            })
            .collect(),
    }
}

/// The three providers in priority order, as fakes.
pub struct FakeProviders {
    pub a: Arc<FakeProvider>,
    pub b: Arc<FakeProvider>,
    pub c: Arc<FakeProvider>,
}

#[allow(dead_code)]
impl FakeProviders {
    pub fn all(reply: ProviderReply) -> Self {
        Self {
            a: FakeProvider::new("a", reply.clone()),
            b: FakeProvider::new("b", reply.clone()),
            c: FakeProvider::new("c", reply),
        }
    }

    pub fn chain(&self) -> Vec<Arc<dyn RaceResultProvider>> {
        vec![self.a.clone(), self.b.clone(), self.c.clone()]
    }
}

// ─── Fake session feed ───────────────────────────────────────

/// Timing feed with canned sessions, positions and drivers.
pub struct FakeFeed {
    sessions: Mutex<Vec<RaceSession>>,
    positions: Mutex<HashMap<u64, Vec<PositionRecord>>>,
    drivers: Mutex<HashMap<u64, Vec<DriverRecord>>>,
}

#[allow(dead_code)]
impl FakeFeed {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(Vec::new()),
            positions: Mutex::new(HashMap::new()),
            drivers: Mutex::new(HashMap::new()),
        }
    }

    /// Add a race session whose podium is `drivers` in finishing order.
    pub fn add_race(
        &self,
        session_key: u64,
        meeting: &str,
        start: DateTime<Utc>,
        drivers: &[(u32, &str, &str, &str)],
    ) {
        self.sessions.lock().unwrap().push(RaceSession {
            session_key,
            meeting_name: meeting.to_string(),
            session_name: "Race".to_string(),
            date_start: start,
        });

        let positions = drivers
            .iter()
            .enumerate()
            .map(|(i, (number, ..))| PositionRecord {
                driver_number: *number,
                position: i as u32 + 1,
                timestamp: start,
            })
            .collect();
        self.positions
            .lock()
            .unwrap()
            .insert(session_key, positions);

        let records = drivers
            .iter()
            .map(|(number, name, team, color)| DriverRecord {
                driver_number: *number,
                full_name: name.to_string(),
                team_name: Some(team.to_string()),
                team_color: Some(color.to_string()),
            })
            .collect();
        self.drivers.lock().unwrap().insert(session_key, records);
    }

    /// Remove a session's driver metadata, returning it.
    pub fn take_drivers(&self, session_key: u64) -> Vec<DriverRecord> {
        self.drivers
            .lock()
            .unwrap()
            .remove(&session_key)
            .unwrap_or_default()
    }

    pub fn put_drivers(&self, session_key: u64, records: Vec<DriverRecord>) {
        self.drivers.lock().unwrap().insert(session_key, records);
    }
}

#[async_trait]
impl RaceSessionFeed for FakeFeed {
    async fn find_race_session(
        &self,
        race_name: &str,
        date: NaiveDate,
    ) -> Result<Option<RaceSession>, ProviderError> {
        Ok(self
            .sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| is_race_session_for(s, race_name, date))
            .cloned())
    }

    async fn positions(&self, session_key: u64) -> Result<Vec<PositionRecord>, ProviderError> {
        Ok(self
            .positions
            .lock()
            .unwrap()
            .get(&session_key)
            .cloned()
            .unwrap_or_default())
    }

    async fn drivers(&self, session_key: u64) -> Result<Vec<DriverRecord>, ProviderError> {
        Ok(self
            .drivers
            .lock()
            .unwrap()
            .get(&session_key)
            .cloned()
            .unwrap_or_default())
    }
}

/// Monaco 2024 podium: (number, name, team, colour).
#[allow(dead_code)]
pub const MONACO_PODIUM: [(u32, &str, &str, &str); 3] = [
    (16, "Charles Leclerc", "Ferrari", "E8002D"),
    (81, "Oscar Piastri", "McLaren", "FF8000"),
    (55, "Carlos Sainz", "Ferrari", "E8002D"),
];

// ─── Test app ────────────────────────────────────────────────

/// Handles to the fakes behind a test app.
#[allow(dead_code)]
pub struct TestHarness {
    pub backend: Arc<InMemoryBackend>,
    pub chain: Arc<FakeChain>,
    pub providers: FakeProviders,
    pub feed: Arc<FakeFeed>,
}

/// Create a test app with offline fake dependencies.
/// Returns the router, the shared state and the fakes.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>, TestHarness) {
    let config = Config::test_default();
    let backend = Arc::new(InMemoryBackend::new());
    let chain = Arc::new(FakeChain::new());
    let providers = FakeProviders::all(ProviderReply::Down);
    let feed = Arc::new(FakeFeed::new());
    let cache = LocalCache::in_memory();

    let membership = MembershipSyncer::new(chain.clone(), backend.clone());
    let watches = MembershipWatchRegistry::new(
        membership.clone(),
        config.membership_poll_interval,
        config.wallet_settle_delay,
    );
    let race_results = Arc::new(RaceResultService::new(RaceResultResolver::new(
        providers.chain(),
        cache.clone(),
    )));

    // Points at a closed port; standings requests fail fast.
    let ergast = ErgastClient::new(&config.ergast_url, config.http_timeout)
        .expect("client should build");
    let standings = StandingsService::new(ergast, backend.clone(), cache);
    let winner_persister = Arc::new(WinnerPersister::new(feed.clone(), backend.clone()));

    let state = Arc::new(AppState {
        config,
        profiles: backend.clone(),
        gallery: backend.clone(),
        winners: backend.clone(),
        schedule: backend.clone(),
        membership,
        watches,
        race_results,
        standings,
        winner_persister,
    });

    let harness = TestHarness {
        backend,
        chain,
        providers,
        feed,
    };

    (create_router(state.clone()), state, harness)
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    serde_json::from_slice(&bytes).expect("body should be JSON")
}
