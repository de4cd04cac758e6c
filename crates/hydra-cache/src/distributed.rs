//! Shared cache tier (L2) contract and the in-process backend.
//!
//! ## Semantics
//!
//! - A missing key is `Ok(None)`, never an error.
//! - Errors describe transport or encoding problems. Hydrators degrade them
//!   to misses on read and ignore them (after logging) on write.
//! - Expiry is TTL-only; nothing in the engine deletes live keys. Backends
//!   that keep entries in process drop expired ones in
//!   [`DistributedCache::purge_expired`], which the engine calls periodically.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheResult;

/// String key/value store shared by every engine instance.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    /// Read a string value. `Ok(None)` when the key is absent or expired.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;

    /// Write a string value with a TTL.
    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Connectivity self-test, called at startup.
    async fn ping(&self) -> CacheResult<()>;

    /// Backend name for logging.
    fn backend_name(&self) -> &'static str;

    /// Drop expired entries held in this process. Returns the number removed.
    ///
    /// Backends that expire keys server-side have nothing to do.
    fn purge_expired(&self) -> usize {
        0
    }
}

/// Typed object access on top of [`DistributedCache`].
///
/// Objects are stored as JSON strings so every instance can decode them
/// regardless of which one wrote them.
#[async_trait]
pub trait DistributedCacheExt: DistributedCache {
    async fn get_object<T>(&self, key: &str) -> CacheResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.get_string(key).await? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn set_object<T>(&self, key: &str, value: &T, ttl: Duration) -> CacheResult<()>
    where
        T: Serialize + Sync,
    {
        let json = serde_json::to_string(value)?;
        self.set_string(key, &json, ttl).await
    }
}

impl<C: DistributedCache + ?Sized> DistributedCacheExt for C {}

pub type DynDistributedCache = Arc<dyn DistributedCache>;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    expires_at: Instant,
}

impl StoredValue {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process stand-in for the distributed tier.
///
/// Used when Redis is disabled or unreachable, and in tests. Values are only
/// shared between hydrators of the same process.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: DashMap<String, StoredValue>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored (possibly expired) entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove expired entries. Returns the number removed.
    pub fn cleanup_expired(&self) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            if entry.is_expired() {
                removed += 1;
                false
            } else {
                true
            }
        });
        removed
    }
}

#[async_trait]
impl DistributedCache for InMemoryCache {
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.value.clone()));
            }
            drop(entry);
            self.entries.remove(key);
        }
        Ok(None)
    }

    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        self.entries.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }

    fn purge_expired(&self) -> usize {
        self.cleanup_expired()
    }
}
