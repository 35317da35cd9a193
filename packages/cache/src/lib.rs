#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! In-memory TTL cache for geospatial query results.
//!
//! Cache entries are ephemeral, idempotent derivations of their inputs:
//! keyed by the canonicalizer in [`key`], bounded by a per-operation TTL,
//! replaced whole on write (never mutated), and evicted lazily. A race
//! between two writers of the same key is harmless — last writer wins
//! with an equivalent value. Failed provider calls are never stored.

pub mod key;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

/// Number of inserts between purge passes over expired entries.
const PURGE_INTERVAL: u64 = 1_024;

/// Per-operation time-to-live configuration.
///
/// Geocodes are stable for a day; routes and snaps for an hour; matrices
/// and ETAs decay faster because traffic moves underneath them.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    /// Forward and reverse geocode results.
    pub geocode: Duration,
    /// Point-to-point routes.
    pub route: Duration,
    /// Distance matrices.
    pub matrix: Duration,
    /// ETA estimates.
    pub eta: Duration,
    /// Snap-to-road results.
    pub snap: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            geocode: Duration::from_secs(24 * 60 * 60),
            route: Duration::from_secs(60 * 60),
            matrix: Duration::from_secs(30 * 60),
            eta: Duration::from_secs(10 * 60),
            snap: Duration::from_secs(60 * 60),
        }
    }
}

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Entry<T> {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// A read-through/write-through TTL cache over cloneable values.
///
/// Reads and writes are atomic per key; there are no cross-key
/// transactions. Expired entries are dropped on read and swept every
/// [`PURGE_INTERVAL`] inserts.
pub struct TtlCache<T> {
    store: RwLock<HashMap<String, Entry<T>>>,
    inserts: RwLock<u64>,
}

impl<T: Clone> Default for TtlCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> TtlCache<T> {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
            inserts: RwLock::new(0),
        }
    }

    /// Returns the cached value for `key` if present and unexpired.
    pub async fn get(&self, key: &str) -> Option<T> {
        let now = Instant::now();

        {
            let store = self.store.read().await;
            match store.get(key) {
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        // Entry exists but expired: evict under the write lock. Re-check
        // expiry in case a concurrent writer refreshed it in between.
        let mut store = self.store.write().await;
        if store.get(key).is_some_and(|entry| entry.is_expired(now)) {
            store.remove(key);
            log::trace!("cache expired: {key}");
        }
        store
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key` for `ttl`, replacing any existing entry.
    pub async fn put(&self, key: String, value: T, ttl: Duration) {
        let now = Instant::now();
        let mut store = self.store.write().await;
        store.insert(
            key,
            Entry {
                value,
                expires_at: now + ttl,
            },
        );

        let mut inserts = self.inserts.write().await;
        *inserts += 1;
        if *inserts % PURGE_INTERVAL == 0 {
            let before = store.len();
            store.retain(|_, entry| !entry.is_expired(now));
            log::debug!("cache purge removed {} entries", before - store.len());
        }
    }

    /// Number of live (possibly expired-but-unswept) entries.
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Returns `true` when the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }
}
