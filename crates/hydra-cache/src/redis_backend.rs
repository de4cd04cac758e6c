//! Redis backend for the distributed tier.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::Pool;
use redis::AsyncCommands;

use crate::config::RedisConfig;
use crate::distributed::{DistributedCache, DynDistributedCache, InMemoryCache};
use crate::error::{CacheError, CacheResult};

/// Key read by [`RedisCache::ping`]; it is never written.
const PING_KEY: &str = "hydra:ping";

/// Distributed cache backed by a deadpool-managed Redis pool.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool,
}

impl RedisCache {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Build a pool from configuration. Does not connect yet.
    pub fn from_config(config: &RedisConfig) -> CacheResult<Self> {
        let mut redis_config = deadpool_redis::Config::from_url(&config.url);
        let timeout = Some(Duration::from_millis(config.timeout_ms));
        let pool_config = redis_config.pool.get_or_insert_with(Default::default);
        pool_config.max_size = config.pool_size;
        pool_config.timeouts.wait = timeout;
        pool_config.timeouts.create = timeout;
        pool_config.timeouts.recycle = timeout;

        let pool = redis_config
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| CacheError::Connection(format!("failed to create Redis pool: {e}")))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl DistributedCache for RedisCache {
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set_string(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut conn = self.pool.get().await?;
        // SET EX rejects 0; sub-second TTLs round up.
        let ttl_secs = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value, ttl_secs).await?;
        Ok(())
    }

    async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.pool.get().await?;
        let _: Option<String> = conn.get(PING_KEY).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "redis"
    }
}

/// Create the distributed tier based on configuration.
///
/// ## Graceful Degradation
///
/// - **Redis disabled**: in-process store
/// - **Redis enabled but unreachable**: in-process store, with a warning
///
/// Hydration keeps working in both cases; only cross-instance sharing is lost.
pub async fn create_distributed_cache(config: &RedisConfig) -> DynDistributedCache {
    if !config.enabled {
        tracing::info!("Redis disabled, using in-process distributed cache");
        return Arc::new(InMemoryCache::new());
    }

    tracing::info!(url = %config.url, "Connecting to Redis");

    let cache = match RedisCache::from_config(config) {
        Ok(cache) => cache,
        Err(e) => {
            tracing::warn!(error = %e, "Falling back to in-process distributed cache");
            return Arc::new(InMemoryCache::new());
        }
    };

    match cache.ping().await {
        Ok(()) => {
            tracing::info!("Connected to Redis");
            Arc::new(cache)
        }
        Err(e) => {
            tracing::warn!(
                error = %e,
                "Redis self-test failed. Falling back to in-process distributed cache."
            );
            Arc::new(InMemoryCache::new())
        }
    }
}
