//! Bounded in-process cache (L1).
//!
//! Backed by `moka`, which admits entries with a TinyLFU frequency sketch and
//! evicts by sampled recency. Entries are weighed by an explicit cost rather
//! than counted, and every entry carries its own TTL.
//!
//! Eviction order is not deterministic; callers must only rely on "a hit
//! returns what was stored, unless it expired".

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use hydra_core::CacheKey;
use moka::Expiry;
use moka::future::Cache;

use crate::config::LocalCacheConfig;

#[derive(Debug, Clone)]
struct LocalEntry<V> {
    value: V,
    cost: u32,
    ttl: Duration,
}

/// Expires each entry after the TTL it was stored with.
struct PerEntryTtl;

impl<V> Expiry<CacheKey, LocalEntry<V>> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &CacheKey,
        value: &LocalEntry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &CacheKey,
        value: &LocalEntry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Local cache statistics for monitoring.
#[derive(Debug, Clone, Default)]
pub struct LocalCacheStats {
    /// Approximate number of live entries
    pub entries: u64,
    /// Approximate aggregate cost of live entries
    pub weighted_size: u64,
    pub hits: u64,
    pub misses: u64,
}

/// Process-local, cost-bounded snapshot cache.
///
/// Reads return clones, so no caller can mutate another caller's snapshot.
/// A disabled or shut-down cache misses on every read and drops every write.
pub struct LocalCache<V> {
    inner: Option<Cache<CacheKey, LocalEntry<V>>>,
    closed: AtomicBool,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V> LocalCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Create a cache bounded by `config.max_cost`.
    pub fn new(config: &LocalCacheConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }

        let cache = Cache::builder()
            .max_capacity(config.max_cost)
            .initial_capacity(config.max_tracked_keys)
            .weigher(|_key: &CacheKey, entry: &LocalEntry<V>| entry.cost)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            inner: Some(cache),
            closed: AtomicBool::new(false),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// A cache that never stores anything.
    pub fn disabled() -> Self {
        Self {
            inner: None,
            closed: AtomicBool::new(true),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn active(&self) -> Option<&Cache<CacheKey, LocalEntry<V>>> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        self.inner.as_ref()
    }

    /// Look up a snapshot. Misses are not errors.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let found = match self.active() {
            Some(cache) => cache.get(key).await.map(|entry| entry.value),
            None => None,
        };

        if found.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        found
    }

    /// Store a snapshot with an admission cost and TTL.
    ///
    /// Admission is not guaranteed: under pressure moka may reject a cold key
    /// in favour of hotter residents.
    pub async fn put(&self, key: CacheKey, value: V, cost: u32, ttl: Duration) {
        let Some(cache) = self.active() else {
            return;
        };
        cache.insert(key, LocalEntry { value, cost, ttl }).await;
    }

    pub fn is_enabled(&self) -> bool {
        self.active().is_some()
    }

    /// Drop every entry and stop serving reads.
    pub async fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(cache) = &self.inner {
            cache.invalidate_all();
            cache.run_pending_tasks().await;
            tracing::debug!("local cache shut down");
        }
    }

    pub fn stats(&self) -> LocalCacheStats {
        let (entries, weighted_size) = match &self.inner {
            Some(cache) => (cache.entry_count(), cache.weighted_size()),
            None => (0, 0),
        };
        LocalCacheStats {
            entries,
            weighted_size,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    /// Flush moka's pending maintenance so counts are exact.
    pub async fn sync(&self) {
        if let Some(cache) = &self.inner {
            cache.run_pending_tasks().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hydra_core::{Identifier, Variant};

    fn key(raw: i64) -> CacheKey {
        CacheKey::image(Identifier::new(raw).unwrap(), Variant::Thumbnail)
    }

    fn small_config(max_cost: u64) -> LocalCacheConfig {
        LocalCacheConfig {
            enabled: true,
            max_tracked_keys: 16,
            max_cost,
        }
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let cache = LocalCache::new(&LocalCacheConfig::default());
        cache
            .put(key(1), "https://cdn/1.jpg".to_string(), 10, Duration::from_secs(60))
            .await;

        assert_eq!(cache.get(&key(1)).await.as_deref(), Some("https://cdn/1.jpg"));
        assert_eq!(cache.get(&key(2)).await, None);

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_ttl() {
        let cache = LocalCache::new(&LocalCacheConfig::default());
        cache
            .put(key(1), "short".to_string(), 1, Duration::from_millis(20))
            .await;
        cache
            .put(key(2), "long".to_string(), 1, Duration::from_secs(60))
            .await;

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(cache.get(&key(1)).await, None);
        assert_eq!(cache.get(&key(2)).await.as_deref(), Some("long"));
    }

    #[tokio::test]
    async fn test_aggregate_cost_is_bounded() {
        let cache = LocalCache::new(&small_config(100));
        for raw in 1..=20 {
            cache
                .put(key(raw), format!("v{raw}"), 25, Duration::from_secs(60))
                .await;
        }
        cache.sync().await;

        let stats = cache.stats();
        assert!(stats.weighted_size <= 100, "weighted size {}", stats.weighted_size);
        assert!(stats.entries <= 4);
    }

    #[tokio::test]
    async fn test_reads_are_independent_copies() {
        let cache = LocalCache::new(&LocalCacheConfig::default());
        cache
            .put(key(1), vec![1, 2, 3], 3, Duration::from_secs(60))
            .await;

        let mut first = cache.get(&key(1)).await.unwrap();
        first.push(4);

        assert_eq!(cache.get(&key(1)).await.unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_disabled_cache_always_misses() {
        let cache: LocalCache<String> = LocalCache::new(&LocalCacheConfig {
            enabled: false,
            ..LocalCacheConfig::default()
        });
        cache
            .put(key(1), "x".to_string(), 1, Duration::from_secs(60))
            .await;

        assert!(!cache.is_enabled());
        assert_eq!(cache.get(&key(1)).await, None);
    }

    #[tokio::test]
    async fn test_shutdown_drains_and_disables() {
        let cache = LocalCache::new(&LocalCacheConfig::default());
        cache
            .put(key(1), "x".to_string(), 1, Duration::from_secs(60))
            .await;
        assert!(cache.get(&key(1)).await.is_some());

        cache.shutdown().await;

        assert_eq!(cache.get(&key(1)).await, None);
        cache
            .put(key(2), "y".to_string(), 1, Duration::from_secs(60))
            .await;
        assert_eq!(cache.get(&key(2)).await, None);
    }
}
