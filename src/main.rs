// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Paddock-Sync API Server
//!
//! Syncs on-chain membership levels into member profiles and serves race
//! results, standings and the community directory.

use paddock_sync::{
    config::Config,
    db::{BackendClient, GalleryStore, InMemoryBackend, ProfileStore, ScheduleStore, WinnerStore},
    services::{
        providers::{
            ErgastClient, ErgastResultsProvider, OpenF1Client, OpenF1LatestProvider,
            OpenF1SessionsProvider, RaceResultProvider,
        },
        LocalCache, MembershipSyncer, MembershipWatchRegistry, RaceResultResolver,
        RaceResultService, SolanaRpcClient, StandingsService, WinnerPersister,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct Backends {
    profiles: Arc<dyn ProfileStore>,
    gallery: Arc<dyn GalleryStore>,
    winners: Arc<dyn WinnerStore>,
    schedule: Arc<dyn ScheduleStore>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Paddock-Sync API");

    let ergast = ErgastClient::new(&config.ergast_url, config.http_timeout)?;
    let openf1 = OpenF1Client::new(&config.openf1_url, config.http_timeout)?;

    let backends = match &config.backend_url {
        Some(url) => {
            let client = Arc::new(BackendClient::new(
                url,
                config.backend_api_key.clone(),
                config.http_timeout,
            )?);
            tracing::info!(url = %url, "Using backend proxy");
            Backends {
                profiles: client.clone(),
                gallery: client.clone(),
                winners: client.clone(),
                schedule: client,
            }
        }
        None => {
            tracing::warn!("BACKEND_URL not set, running with in-memory backend");
            let memory = Arc::new(InMemoryBackend::new());
            Backends {
                profiles: memory.clone(),
                gallery: memory.clone(),
                winners: memory,
                // The public calendar stands in for the proxy's schedule table.
                schedule: Arc::new(ergast.clone()),
            }
        }
    };

    let cache = match &config.cache_path {
        Some(path) => LocalCache::load(path).await,
        None => LocalCache::in_memory(),
    };

    // Chain reader
    let chain = Arc::new(SolanaRpcClient::new(
        &config.solana_rpc_url,
        &config.membership_program_id,
        config.http_timeout,
    )?);
    tracing::info!(
        rpc = %config.solana_rpc_url,
        program = %config.membership_program_id,
        "Chain client initialized"
    );

    let membership = MembershipSyncer::new(chain, backends.profiles.clone());
    let watches = MembershipWatchRegistry::new(
        membership.clone(),
        config.membership_poll_interval,
        config.wallet_settle_delay,
    );

    // Providers in priority order
    let providers: Vec<Arc<dyn RaceResultProvider>> = vec![
        Arc::new(OpenF1SessionsProvider::new(openf1.clone())),
        Arc::new(OpenF1LatestProvider::new(openf1.clone())),
        Arc::new(ErgastResultsProvider::new(ergast.clone())),
    ];
    let race_results = Arc::new(RaceResultService::new(RaceResultResolver::new(
        providers,
        cache.clone(),
    )));

    let standings = StandingsService::new(ergast, backends.schedule.clone(), cache);
    let winner_persister = Arc::new(WinnerPersister::new(
        Arc::new(openf1),
        backends.winners.clone(),
    ));

    // Background loops
    tokio::spawn(race_results.clone().run(config.race_refresh_interval));
    tokio::spawn(
        winner_persister
            .clone()
            .run(backends.schedule.clone(), config.winner_check_interval),
    );
    tracing::info!(
        refresh_secs = config.race_refresh_interval.as_secs(),
        winner_check_secs = config.winner_check_interval.as_secs(),
        "Background refresh started"
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        profiles: backends.profiles,
        gallery: backends.gallery,
        winners: backends.winners,
        schedule: backends.schedule,
        membership,
        watches,
        race_results,
        standings,
        winner_persister,
    });

    // Build router
    let app = paddock_sync::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("paddock_sync=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
