// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Latest race result resolution.
//!
//! Providers are tried strictly in priority order and the first non-empty
//! podium wins. When all of them fail the last cached podium is served, and
//! only with no cache at all is the result reported unavailable.
//!
//! Refreshes run on a fixed interval. Each run is tagged with a generation
//! number so a slow run finishing after a newer one cannot overwrite it,
//! neither in the published view nor in the cache.

use crate::models::RaceResult;
use crate::services::cache::{keys, LocalCache};
use crate::services::providers::RaceResultProvider;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Outcome of one pass through the provider chain.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Resolution {
    /// Fresh data from a provider.
    Live {
        provider: String,
        result: RaceResult,
    },
    /// Every provider failed; last known good data.
    Cached {
        result: RaceResult,
        cached_at: DateTime<Utc>,
    },
    /// Every provider failed and nothing is cached.
    Unavailable,
}

impl Resolution {
    pub fn result(&self) -> Option<&RaceResult> {
        match self {
            Resolution::Live { result, .. } | Resolution::Cached { result, .. } => Some(result),
            Resolution::Unavailable => None,
        }
    }
}

/// Walks the provider chain.
pub struct RaceResultResolver {
    providers: Vec<Arc<dyn RaceResultProvider>>,
    cache: LocalCache,
}

impl RaceResultResolver {
    /// `providers` in priority order.
    pub fn new(providers: Vec<Arc<dyn RaceResultProvider>>, cache: LocalCache) -> Self {
        Self { providers, cache }
    }

    /// One pass through the chain. Does not touch the cache on success; the
    /// caller decides whether the result is current enough to keep.
    pub async fn resolve(&self) -> Resolution {
        for provider in &self.providers {
            match provider.latest_result().await {
                Ok(result) if !result.podium.is_empty() => {
                    tracing::info!(
                        provider = provider.name(),
                        meeting = %result.meeting_name,
                        session = %result.session_name,
                        "Resolved latest race result"
                    );
                    return Resolution::Live {
                        provider: provider.name().to_string(),
                        result,
                    };
                }
                Ok(_) => {
                    tracing::debug!(provider = provider.name(), "Provider returned empty podium");
                }
                Err(e) if e.is_expected() => {
                    tracing::debug!(provider = provider.name(), reason = %e, "Provider has no result");
                }
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Provider failed");
                }
            }
        }

        match self.cache.get::<RaceResult>(keys::LATEST_RACE_RESULT) {
            Some(hit) => {
                tracing::warn!(cached_at = %hit.cached_at, "All providers failed, serving cached result");
                Resolution::Cached {
                    result: hit.value,
                    cached_at: hit.cached_at,
                }
            }
            None => {
                tracing::warn!("All providers failed and no cached result exists");
                Resolution::Unavailable
            }
        }
    }

    /// Store a live result as the last known good one.
    pub async fn remember(&self, result: &RaceResult) {
        self.cache.put(keys::LATEST_RACE_RESULT, result).await;
    }
}

/// A resolution as currently shown to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PublishedResult {
    pub generation: u64,
    pub resolved_at: DateTime<Utc>,
    #[serde(flatten)]
    pub resolution: Resolution,
}

/// Periodically refreshed, generation-ordered view of the latest result.
pub struct RaceResultService {
    resolver: RaceResultResolver,
    next_generation: AtomicU64,
    published: RwLock<Option<PublishedResult>>,
}

impl RaceResultService {
    pub fn new(resolver: RaceResultResolver) -> Self {
        Self {
            resolver,
            next_generation: AtomicU64::new(0),
            published: RwLock::new(None),
        }
    }

    /// Reserve the generation number for a new run.
    pub fn begin_run(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a run's resolution unless a newer run already published.
    /// An accepted live result also replaces the cached one. Returns whether
    /// it was accepted.
    pub async fn publish(&self, generation: u64, resolution: Resolution) -> bool {
        let mut published = self.published.write().await;
        if let Some(current) = published.as_ref() {
            if current.generation >= generation {
                tracing::debug!(
                    generation,
                    current = current.generation,
                    "Discarding stale race result"
                );
                return false;
            }
        }

        // Under the lock so cache writes follow generation order.
        if let Resolution::Live { result, .. } = &resolution {
            self.resolver.remember(result).await;
        }

        *published = Some(PublishedResult {
            generation,
            resolved_at: Utc::now(),
            resolution,
        });
        true
    }

    /// Run the provider chain once and publish the outcome.
    pub async fn refresh(&self) -> Resolution {
        let generation = self.begin_run();
        let resolution = self.resolver.resolve().await;
        self.publish(generation, resolution.clone()).await;
        resolution
    }

    pub async fn latest(&self) -> Option<PublishedResult> {
        self.published.read().await.clone()
    }

    /// Refresh every `period` until the task is dropped. Each tick runs in its
    /// own task so a slow provider never delays the next tick.
    pub async fn run(self: Arc<Self>, period: Duration) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let service = self.clone();
            tokio::spawn(async move {
                service.refresh().await;
            });
        }
    }
}
