//! Cache tier configuration

use serde::{Deserialize, Serialize};

/// Local (L1) cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalCacheConfig {
    /// Disable to run every lookup against the distributed tier
    #[serde(default = "default_local_enabled")]
    pub enabled: bool,

    /// Expected number of distinct keys; sizes the admission sketch
    #[serde(default = "default_max_tracked_keys")]
    pub max_tracked_keys: usize,

    /// Maximum aggregate cost (bytes) of all cached entries
    #[serde(default = "default_max_cost")]
    pub max_cost: u64,
}

fn default_local_enabled() -> bool {
    true
}

fn default_max_tracked_keys() -> usize {
    100_000
}

fn default_max_cost() -> u64 {
    64 * 1024 * 1024
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_local_enabled(),
            max_tracked_keys: default_max_tracked_keys(),
            max_cost: default_max_cost(),
        }
    }
}

/// Redis (L2) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Enable Redis (gracefully degrades to an in-process store without it)
    #[serde(default = "default_redis_enabled")]
    pub enabled: bool,

    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default = "default_redis_url")]
    pub url: String,

    /// Connection pool size
    #[serde(default = "default_redis_pool_size")]
    pub pool_size: usize,

    /// Connection timeout in milliseconds
    #[serde(default = "default_redis_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_redis_enabled() -> bool {
    false
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_redis_pool_size() -> usize {
    10
}

fn default_redis_timeout_ms() -> u64 {
    5000
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: default_redis_enabled(),
            url: default_redis_url(),
            pool_size: default_redis_pool_size(),
            timeout_ms: default_redis_timeout_ms(),
        }
    }
}
