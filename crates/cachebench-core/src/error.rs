//! Unified error type for the cachebench crates.

use std::error::Error as StdError;
use thiserror::Error;

/// Unified error type for cachebench.
///
/// Lower layers keep their own structured errors (the cache crate's
/// `CacheError` carries the failing operation and the store cause) and
/// convert into this enum at the application boundary.
#[derive(Error, Debug)]
pub enum CacheBenchError {
    // ============ Setup Errors ============
    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Fixture could not be read or parsed
    #[error("Fixture error: {path} - {message}")]
    Fixture { path: String, message: String },

    // ============ Infrastructure Errors ============
    /// Cache operation failed; the source is the structured cache error
    #[error("Cache error: {0}")]
    Cache(#[source] Box<dyn StdError + Send + Sync + 'static>),

    // ============ Runtime Errors ============
    /// Run aborted by a shutdown signal
    #[error("Benchmark interrupted by shutdown signal")]
    Interrupted,

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CacheBenchError {
    /// Returns a machine-readable error code.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Fixture { .. } => "FIXTURE_ERROR",
            Self::Cache(_) => "CACHE_ERROR",
            Self::Interrupted => "INTERRUPTED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn configuration<T: Into<String>>(message: T) -> Self {
        Self::Configuration(message.into())
    }

    /// Creates a fixture error for the given path.
    #[must_use]
    pub fn fixture<P: ToString, M: ToString>(path: P, message: M) -> Self {
        Self::Fixture {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Wraps a lower-level cache error, keeping it as the error source.
    #[must_use]
    pub fn cache<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        Self::Cache(Box::new(error))
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal<T: Into<String>>(message: T) -> Self {
        Self::Internal(message.into())
    }
}

impl From<serde_json::Error> for CacheBenchError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON serialization error: {}", err))
    }
}
