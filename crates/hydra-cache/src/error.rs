//! Error types for cache backends

use thiserror::Error;

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by distributed cache backends.
///
/// Hydrators never surface these to callers: a failed read is treated as a
/// miss and a failed write is logged.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Could not obtain a connection to the backend
    #[error("cache connection error: {0}")]
    Connection(String),

    /// The backend rejected or failed a command
    #[error("cache command error: {0}")]
    Command(String),

    /// Stored value could not be encoded or decoded
    #[error("cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(err: deadpool_redis::PoolError) -> Self {
        CacheError::Connection(err.to_string())
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        CacheError::Command(err.to_string())
    }
}
