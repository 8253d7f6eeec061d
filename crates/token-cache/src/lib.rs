//! Time bound cache of token review results.
//!
//! Both successful and failed resolutions are cached, so a revoked or mistyped token
//! does not hit the GitLab API on every retry of the API server.

mod eviction;

pub use eviction::EvictionTask;

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use access::Identity;
use dashmap::DashMap;
use serde::Serialize;
use telemetry::metrics::{CACHE_EVICTIONS, CACHE_HITS, CACHE_INSERTIONS, CACHE_MISSES};
use tokio::time::Instant;

/// Sharded map from raw token to the identity it resolved to.
///
/// Cloning is cheap and every clone shares the same entries and counters.
#[derive(Clone)]
pub struct UserInfoCache {
    inner: Arc<Inner>,
}

struct Inner {
    entries: DashMap<String, Entry>,
    ttl: Duration,
    stats: Stats,
}

struct Entry {
    identity: Identity,
    expires_at: Instant,
}

#[derive(Default)]
struct Stats {
    insertions: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

/// Point in time view of the cache counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheMetrics {
    pub insertions: u64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub entries: usize,
}

impl UserInfoCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                ttl,
                stats: Stats::default(),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Returns the live entry for the token. Expired entries are removed and count as a miss.
    pub fn get(&self, token: &str) -> Option<Identity> {
        let now = Instant::now();

        let expired = match self.inner.entries.get(token) {
            Some(entry) if entry.expires_at > now => {
                self.inner.stats.hits.fetch_add(1, Ordering::Relaxed);
                metrics::counter!(CACHE_HITS).increment(1);

                return Some(entry.identity.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired && self.inner.entries.remove_if(token, |_, e| e.expires_at <= now).is_some() {
            self.record_evictions(1);
        }

        self.inner.stats.misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(CACHE_MISSES).increment(1);

        None
    }

    /// Stores the identity for the configured TTL, replacing any previous entry.
    pub fn set(&self, token: impl Into<String>, identity: Identity) {
        let entry = Entry {
            identity,
            expires_at: Instant::now() + self.inner.ttl,
        };

        self.inner.entries.insert(token.into(), entry);

        self.inner.stats.insertions.fetch_add(1, Ordering::Relaxed);
        metrics::counter!(CACHE_INSERTIONS).increment(1);
    }

    /// Removes every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut evicted = 0;

        self.inner.entries.retain(|_, entry| {
            let live = entry.expires_at > now;

            if !live {
                evicted += 1;
            }

            live
        });

        if evicted > 0 {
            self.record_evictions(evicted);
        }

        evicted
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    pub fn metrics(&self) -> CacheMetrics {
        let stats = &self.inner.stats;

        CacheMetrics {
            insertions: stats.insertions.load(Ordering::Relaxed),
            hits: stats.hits.load(Ordering::Relaxed),
            misses: stats.misses.load(Ordering::Relaxed),
            evictions: stats.evictions.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }

    fn record_evictions(&self, count: usize) {
        self.inner.stats.evictions.fetch_add(count as u64, Ordering::Relaxed);
        metrics::counter!(CACHE_EVICTIONS).increment(count as u64);
    }
}
