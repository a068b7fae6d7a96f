//! Application configuration structures.

use crate::RedisMode;
use cachebench_core::{CacheBenchError, CacheBenchResult, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Application name and metadata.
    #[serde(default)]
    pub app: AppMetadata,

    /// Redis connection configuration.
    #[serde(default)]
    pub redis: RedisConfig,

    /// Distributed cache options.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Benchmark run configuration.
    #[serde(default)]
    pub bench: BenchConfig,

    /// Logging configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Application metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppMetadata {
    /// Application name.
    pub name: String,
    /// Application version.
    pub version: String,
    /// Environment (development, staging, production).
    pub environment: String,
}

impl Default for AppMetadata {
    fn default() -> Self {
        Self {
            name: "cachebench".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

/// Redis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Use Redis. When disabled the benchmark runs against an in-process store.
    pub enabled: bool,
    /// Server address as `host:port`, or a full `redis://` URL.
    pub address: String,
    /// ACL username.
    pub username: Option<String>,
    /// Password.
    pub password: Option<String>,
    /// Logical database index.
    pub database: u8,
    /// Deployment topology.
    pub mode: RedisMode,
    /// Refuse all writes.
    pub read_only: bool,
    /// Connection pool size.
    pub pool_size: usize,
    /// Connection timeout in seconds.
    pub connect_timeout_secs: u64,
    /// Wrap batch pipelines in MULTI/EXEC.
    pub atomic_batches: bool,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            address: "127.0.0.1:6379".to_string(),
            username: None,
            password: None,
            database: 0,
            mode: RedisMode::Single,
            read_only: false,
            pool_size: 10,
            connect_timeout_secs: 5,
            atomic_batches: false,
        }
    }
}

impl RedisConfig {
    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Builds the `redis://` connection URL, with credentials percent-encoded.
    pub fn connection_url(&self) -> CacheBenchResult<String> {
        let raw = if self.address.contains("://") {
            self.address.clone()
        } else {
            format!("redis://{}", self.address)
        };

        let mut url = Url::parse(&raw).map_err(|e| {
            CacheBenchError::Configuration(format!("Invalid Redis address '{}': {}", self.address, e))
        })?;

        if let Some(username) = &self.username {
            url.set_username(username).map_err(|()| {
                CacheBenchError::Configuration("Redis address cannot carry a username".to_string())
            })?;
        }

        if let Some(password) = &self.password {
            url.set_password(Some(password)).map_err(|()| {
                CacheBenchError::Configuration("Redis address cannot carry a password".to_string())
            })?;
        }

        url.set_path(&format!("/{}", self.database));

        Ok(url.to_string())
    }
}

/// Distributed cache options.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Deployment-wide prefix placed in front of every identity key.
    /// Used verbatim; no separator is added.
    pub key_prefix: String,
}

/// Benchmark run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchConfig {
    /// Path of the JSON fixture.
    pub fixture_path: String,
    /// Specialty category stamped on every generated record.
    pub specialty_category: String,
    /// Value stamped on every generated record.
    pub record_value: String,
    /// Expiration of written entries, relative to the moment of the write.
    /// Zero writes entries without expiry.
    pub expiration_secs: u64,
    /// Where to write the JSON report, if anywhere.
    pub report_path: Option<String>,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            fixture_path: "fixtures/bigMappings.json".to_string(),
            specialty_category: "S30".to_string(),
            record_value: "123.45".to_string(),
            expiration_secs: 300, // 5 minutes
            report_path: None,
        }
    }
}

impl BenchConfig {
    /// Returns the entry expiration as a Duration.
    #[must_use]
    pub const fn expiration(&self) -> Duration {
        Duration::from_secs(self.expiration_secs)
    }
}
