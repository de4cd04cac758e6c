//! # hydra-cache
//!
//! Cache tiers for the Hydra hydration engine.
//!
//! ## Cache Hierarchy
//!
//! ```text
//! lookup → L1 (moka, per process) → L2 (Redis, shared) → origin
//!              <1µs                     ~1-5ms            ~50ms
//! ```
//!
//! ## Graceful Degradation
//!
//! If Redis is disabled or unreachable at startup, the distributed tier falls
//! back to an in-process store; at runtime, failed reads become misses.

pub mod config;
pub mod distributed;
mod error;
pub mod local;
pub mod redis_backend;

pub use config::{LocalCacheConfig, RedisConfig};
pub use distributed::{DistributedCache, DistributedCacheExt, DynDistributedCache, InMemoryCache};
pub use error::{CacheError, CacheResult};
pub use local::{LocalCache, LocalCacheStats};
pub use redis_backend::{RedisCache, create_distributed_cache};
