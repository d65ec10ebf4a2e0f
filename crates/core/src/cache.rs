//! Search result cache store
//!
//! In-memory cache-aside store for search results with per-entry TTL expiry.
//! Entries are created on a miss-then-fetch, replaced on write, and never
//! returned once their TTL has elapsed; `get` answers "absent" both for keys
//! that were never set and for keys whose entry expired, so callers always
//! fall back to the backing provider.
//!
//! The store carries a connectivity flag. While disconnected it degrades to
//! always-miss behavior: `get` returns `None` and `set` is a no-op returning
//! `false`. It never surfaces an error to the caller.

use moka::future::Cache;
use moka::Expiry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::types::{Hotel, SearchKey};

/// Cache store configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries held at once
    pub max_capacity: u64,
    /// TTL applied to search results stored by the orchestrator
    pub default_ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 10_000,
            default_ttl: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Creates a new cache configuration
    pub fn new(max_capacity: u64, default_ttl: Duration) -> Self {
        Self {
            max_capacity,
            default_ttl,
        }
    }
}

/// A cached result set together with its expiry policy
#[derive(Debug, Clone)]
pub struct CachedResults {
    /// The result set stored on a cache miss
    pub hotels: Vec<Hotel>,
    /// Timestamp of the `set` call that created this entry
    pub cached_at: chrono::DateTime<chrono::Utc>,
    /// TTL relative to `cached_at`
    pub ttl: Duration,
}

impl CachedResults {
    /// Wraps a result set for storage with the given TTL
    pub fn new(hotels: Vec<Hotel>, ttl: Duration) -> Self {
        Self {
            hotels,
            cached_at: chrono::Utc::now(),
            ttl,
        }
    }
}

/// Per-entry expiry: each entry lives for the TTL it was stored with
struct EntryTtl;

impl Expiry<SearchKey, CachedResults> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &SearchKey,
        value: &CachedResults,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory search result cache with TTL expiry and a connectivity flag
pub struct SearchCache {
    cache: Cache<SearchKey, CachedResults>,
    connected: AtomicBool,
    config: CacheConfig,
}

impl SearchCache {
    /// Creates a new cache store
    ///
    /// # Examples
    ///
    /// ```
    /// use hotelfinder_core::cache::{CacheConfig, SearchCache};
    ///
    /// let cache = SearchCache::new(CacheConfig::default());
    /// assert!(cache.healthy());
    /// ```
    pub fn new(config: CacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(EntryTtl)
            .build();

        Self {
            cache,
            connected: AtomicBool::new(true),
            config,
        }
    }

    /// Looks up a cached result set
    ///
    /// Returns `None` when the key was never set, when its TTL elapsed, or
    /// when the store is disconnected. Callers cannot distinguish these
    /// cases and are expected to fall back to the backing provider.
    pub async fn get(&self, key: &SearchKey) -> Option<CachedResults> {
        if !self.healthy() {
            return None;
        }
        self.cache.get(key).await
    }

    /// Stores a result set under `key` with a TTL relative to now
    ///
    /// Overwrites any existing entry. Returns `false` without storing when
    /// the store is disconnected.
    pub async fn set(&self, key: SearchKey, hotels: Vec<Hotel>, ttl: Duration) -> bool {
        if !self.healthy() {
            return false;
        }
        self.cache.insert(key, CachedResults::new(hotels, ttl)).await;
        true
    }

    /// Removes a single entry
    pub async fn invalidate(&self, key: &SearchKey) {
        self.cache.invalidate(key).await;
    }

    /// Removes all entries
    pub async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }

    /// Whether the underlying store is reachable
    pub fn healthy(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Marks the store reachable or unreachable
    ///
    /// Used by health management and by tests simulating an outage.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Relaxed);
    }

    /// Number of entries currently held
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// The cache configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}
