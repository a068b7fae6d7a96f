//! Cache error types.

use cachebench_core::CacheBenchError;
use std::fmt;
use thiserror::Error;

/// Result type for raw store calls.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for gateway operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors raised by a [`CacheStore`](crate::CacheStore) or while encoding values.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Redis error.
    #[error("Redis error: {0}")]
    Redis(#[from] deadpool_redis::redis::RedisError),

    /// Redis pool error.
    #[error("Redis pool error: {0}")]
    Pool(#[from] deadpool_redis::PoolError),

    /// Value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Write attempted against a read-only store.
    #[error("Store is read-only")]
    ReadOnly,

    /// Store was closed.
    #[error("Store is closed")]
    Closed,

    /// Store was built without a connection pool.
    #[error("Store has no connection pool")]
    NotConnected,

    /// Batch read answered with the wrong number of values.
    #[error("Store returned {actual} values for {expected} keys")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Gateway operation names, used to tag errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOperation {
    Set,
    Get,
    Remove,
    SetMany,
    GetMany,
    RemoveMany,
    GetOrAddMany,
}

impl CacheOperation {
    /// Returns the operation name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "Set",
            Self::Get => "Get",
            Self::Remove => "Remove",
            Self::SetMany => "SetMany",
            Self::GetMany => "GetMany",
            Self::RemoveMany => "RemoveMany",
            Self::GetOrAddMany => "GetOrAddMany",
        }
    }

    /// Tags `source` with this operation.
    pub fn error(self, source: impl Into<StoreError>) -> CacheError {
        CacheError::new(self, source.into())
    }
}

impl fmt::Display for CacheOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed gateway operation and its underlying cause.
#[derive(Debug, Error)]
#[error("{operation} failed: {source}")]
pub struct CacheError {
    /// The operation that failed.
    pub operation: CacheOperation,
    /// The store or serialization error behind it.
    pub source: StoreError,
}

impl CacheError {
    /// Creates a new cache error.
    #[must_use]
    pub const fn new(operation: CacheOperation, source: StoreError) -> Self {
        Self { operation, source }
    }
}

impl From<CacheError> for CacheBenchError {
    fn from(err: CacheError) -> Self {
        CacheBenchError::cache(err)
    }
}
