// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Advisory local cache for last-known-good provider payloads.
//!
//! Entries are never authoritative: they are only read when every live
//! source has failed, and any successful fetch overwrites them.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Cache keys, one per result kind.
pub mod keys {
    pub const LATEST_RACE_RESULT: &str = "latest_race_result";
    pub const DRIVER_STANDINGS: &str = "driver_standings";
    pub const NEXT_RACE: &str = "next_race";
}

/// A cached payload with the time it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

/// Typed view of a cache hit.
#[derive(Debug, Clone)]
pub struct Cached<T> {
    pub value: T,
    pub cached_at: DateTime<Utc>,
}

/// Shared key/value cache, optionally mirrored to a JSON file.
#[derive(Clone, Default)]
pub struct LocalCache {
    entries: Arc<DashMap<String, CacheEntry>>,
    path: Option<PathBuf>,
}

impl LocalCache {
    /// Memory-only cache.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Cache persisted to `path`. An unreadable file starts the cache empty.
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = DashMap::new();

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<HashMap<String, CacheEntry>>(&bytes) {
                Ok(stored) => {
                    tracing::info!(path = %path.display(), entries = stored.len(), "Loaded local cache");
                    for (key, entry) in stored {
                        entries.insert(key, entry);
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring corrupt cache file");
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Cannot read cache file"),
        }

        Self {
            entries: Arc::new(entries),
            path: Some(path),
        }
    }

    /// Read an entry, `None` when absent or of another shape.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<Cached<T>> {
        let entry = self.entries.get(key)?.clone();
        match serde_json::from_value(entry.payload) {
            Ok(value) => Some(Cached {
                value,
                cached_at: entry.timestamp,
            }),
            Err(e) => {
                tracing::warn!(key, error = %e, "Discarding unreadable cache entry");
                None
            }
        }
    }

    /// Overwrite an entry with a fresh payload.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) {
        let payload = match serde_json::to_value(value) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cannot serialize cache payload");
                return;
            }
        };

        self.entries.insert(
            key.to_string(),
            CacheEntry {
                payload,
                timestamp: Utc::now(),
            },
        );
        self.persist().await;
    }

    /// Best-effort write of the whole cache to disk.
    async fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };

        let snapshot: HashMap<String, CacheEntry> = self
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();

        let bytes = match serde_json::to_vec(&snapshot) {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(error = %e, "Cannot serialize cache");
                return;
            }
        };

        if let Err(e) = tokio::fs::write(path, bytes).await {
            tracing::warn!(path = %path.display(), error = %e, "Cannot write cache file");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_overwrites() {
        let cache = LocalCache::in_memory();
        cache.put("k", &vec![1, 2]).await;
        cache.put("k", &vec![3]).await;

        let hit: Cached<Vec<u32>> = cache.get("k").unwrap();
        assert_eq!(hit.value, vec![3]);
        assert!(cache.get::<Vec<u32>>("missing").is_none());
    }

    #[tokio::test]
    async fn test_wrong_shape_is_a_miss() {
        let cache = LocalCache::in_memory();
        cache.put("k", &"text").await;
        assert!(cache.get::<Vec<u32>>("k").is_none());
    }

    #[tokio::test]
    async fn test_persists_across_loads() {
        let path = std::env::temp_dir().join(format!("paddock-cache-{}.json", std::process::id()));
        let _ = tokio::fs::remove_file(&path).await;

        let cache = LocalCache::load(&path).await;
        cache.put(keys::NEXT_RACE, &"Monaco Grand Prix").await;

        let reloaded = LocalCache::load(&path).await;
        let hit: Cached<String> = reloaded.get(keys::NEXT_RACE).unwrap();
        assert_eq!(hit.value, "Monaco Grand Prix");

        let _ = tokio::fs::remove_file(&path).await;
    }
}
