//! Logging initialisation.
//!
//! Sets up a `tracing` subscriber with an `EnvFilter` and either a pretty or
//! a JSON formatting layer. `RUST_LOG` takes precedence over the configured
//! level.

#[cfg(feature = "telemetry")]
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::CacheBenchResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Default filter directive when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log line format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Whether to print the event target.
    #[serde(default = "default_with_target")]
    pub with_target: bool,
}

fn default_log_level() -> String {
    "info,cachebench=debug".to_string()
}

fn default_with_target() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            with_target: default_with_target(),
        }
    }
}

/// Initialize the global tracing subscriber.
///
/// Fails if a global subscriber has already been installed.
#[cfg(feature = "telemetry")]
pub fn init_telemetry(config: &TelemetryConfig) -> CacheBenchResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let result = match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(config.with_target))
            .try_init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(config.with_target),
            )
            .try_init(),
    };

    result.map_err(|e| crate::CacheBenchError::Internal(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(
        log_level = %config.log_level,
        log_format = %config.log_format,
        "Telemetry initialized"
    );

    Ok(())
}

/// Placeholder for when telemetry feature is disabled.
#[cfg(not(feature = "telemetry"))]
pub fn init_telemetry(_config: &TelemetryConfig) -> CacheBenchResult<()> {
    Ok(())
}

/// Run `f` with a default-configured subscriber scoped to the current thread.
///
/// Used for work that logs before the configured global subscriber can be
/// installed, such as loading the configuration itself.
#[cfg(feature = "telemetry")]
pub fn with_bootstrap_logging<R>(f: impl FnOnce() -> R) -> R {
    let config = TelemetryConfig::default();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(config.with_target));

    tracing::subscriber::with_default(subscriber, f)
}

/// Placeholder for when telemetry feature is disabled.
#[cfg(not(feature = "telemetry"))]
pub fn with_bootstrap_logging<R>(f: impl FnOnce() -> R) -> R {
    f()
}
