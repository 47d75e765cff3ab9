//! Memo Cache Module
//!
//! The get-or-compute engine: structural keys, TTL expiry and prefix-scoped
//! invalidation over a shared, type-erased map.
//!
//! Lookups share a read lock and counters are atomic, so hits never
//! serialize; the write lock is only taken to store or clear. The lock is
//! never held while a compute future runs. Two tasks missing the
//! same key at once both compute and both store; the later write wins and
//! each caller still gets a correct value.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::cache::{derive_key, namespace_of, CacheEntry, CacheStats, KeyPart, StatsCounters};

/// TTL used when a caller does not pass one.
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

// == Cache Info ==
/// Freshness snapshot for operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheInfo {
    /// Wall-clock time of the most recent store, None after any clear
    pub last_updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct MemoState {
    entries: HashMap<String, CacheEntry>,
    last_updated_at: Option<DateTime<Utc>>,
}

// == Memo Cache ==
/// Process-local memoization cache.
///
/// Cloning yields another handle to the same underlying map.
#[derive(Debug, Clone)]
pub struct MemoCache {
    state: Arc<RwLock<MemoState>>,
    counters: Arc<StatsCounters>,
    default_ttl: Duration,
}

impl Default for MemoCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoCache {
    // == Constructor ==
    /// Creates an empty cache with the 24 hour default TTL.
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }

    /// Creates an empty cache whose `get_or_compute` uses `default_ttl`.
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoState::default())),
            counters: Arc::new(StatsCounters::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Get Or Compute ==
    /// Returns the live value for `(prefix, parts)` or computes and stores it
    /// with the default TTL.
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        prefix: &str,
        parts: &[KeyPart],
        compute: F,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.get_or_compute_with_ttl(prefix, parts, compute, self.default_ttl)
            .await
    }

    /// Returns the live value for `(prefix, parts)` or computes and stores it
    /// for `ttl`.
    ///
    /// `compute` runs at most once per call. Its error is returned as is and
    /// nothing is written, so a previous live entry stays usable.
    pub async fn get_or_compute_with_ttl<T, E, F, Fut>(
        &self,
        prefix: &str,
        parts: &[KeyPart],
        compute: F,
        ttl: Duration,
    ) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = derive_key(prefix, parts);
        let now = Instant::now();
        let wall_now = Utc::now();

        let cached = self
            .state
            .read()
            .await
            .entries
            .get(&key)
            .filter(|entry| !entry.is_expired_at(now))
            .and_then(|entry| entry.value::<T>());

        if let Some(value) = cached {
            self.counters.record_hit();
            debug!(key = %key, "memo cache hit");
            return Ok(value);
        }

        self.counters.record_miss();
        debug!(key = %key, "memo cache miss");

        let value = match compute().await {
            Ok(value) => value,
            Err(err) => {
                self.counters.record_failure();
                warn!(key = %key, "compute failed, result not cached");
                return Err(err);
            }
        };

        let mut state = self.state.write().await;
        state
            .entries
            .insert(key, CacheEntry::new(value.clone(), now, ttl));
        state.last_updated_at = Some(wall_now);
        Ok(value)
    }

    // == Clear ==
    /// Removes every entry, or only those derived under `prefix`.
    ///
    /// An empty prefix clears everything. A prefix clear only matches whole
    /// namespaces: `worlds` never touches keys derived under `worldsTag`.
    /// Either way `last_updated_at` is reset. Returns the number removed.
    pub async fn clear(&self, prefix: Option<&str>) -> usize {
        let mut state = self.state.write().await;
        let before = state.entries.len();

        match prefix.filter(|p| !p.is_empty()) {
            None => state.entries.clear(),
            Some(prefix) => {
                let namespace = namespace_of(prefix);
                state.entries.retain(|key, _| !key.starts_with(&namespace));
            }
        }
        state.last_updated_at = None;

        let removed = before - state.entries.len();
        info!(prefix = prefix.unwrap_or("*"), removed, "memo cache cleared");
        removed
    }

    // == Info ==
    /// Returns when the cache was last written.
    pub async fn info(&self) -> CacheInfo {
        CacheInfo {
            last_updated_at: self.state.read().await.last_updated_at,
        }
    }

    // == Stats ==
    /// Returns current usage counters.
    pub async fn stats(&self) -> CacheStats {
        let total_entries = self.state.read().await.entries.len();
        self.counters.snapshot(total_entries)
    }

    // == Length ==
    /// Returns the number of stored entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

// == Global Instance ==
static GLOBAL: OnceLock<MemoCache> = OnceLock::new();

/// Returns the process-wide cache, creating it with the 24 hour default TTL
/// on first use.
pub fn global() -> &'static MemoCache {
    GLOBAL.get_or_init(MemoCache::new)
}

/// Returns the process-wide cache, creating it with `default_ttl` if this is
/// the first access. Later calls return the existing instance unchanged.
pub fn init_global(default_ttl: Duration) -> &'static MemoCache {
    GLOBAL.get_or_init(|| MemoCache::with_default_ttl(default_ttl))
}
