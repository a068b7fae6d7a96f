//! Result type aliases for cachebench.

use crate::CacheBenchError;

/// A specialized `Result` type for cachebench operations.
pub type CacheBenchResult<T> = Result<T, CacheBenchError>;
