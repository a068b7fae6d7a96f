//! Configuration loader with layered sources.

use crate::AppConfig;
use cachebench_core::CacheBenchError;
use config::{Config, ConfigError, Environment, File};
use std::path::Path;
use tracing::{debug, info, warn};

/// Configuration loader.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: AppConfig,
    config_dir: String,
}

impl ConfigLoader {
    /// Creates a new configuration loader.
    ///
    /// Configuration is loaded from multiple sources in order:
    /// 1. `config/default.toml` - Default values
    /// 2. `config/{environment}.toml` - Environment-specific overrides
    /// 3. `config/local.toml` - Local overrides
    /// 4. Environment variables with `CACHEBENCH__` prefix
    ///    (e.g. `CACHEBENCH__REDIS__ADDRESS`)
    pub fn new(config_dir: impl Into<String>) -> Result<Self, CacheBenchError> {
        let config_dir = config_dir.into();
        let config = Self::load_config(&config_dir)?;

        Ok(Self { config, config_dir })
    }

    /// Loads configuration from the default location (`./config`).
    pub fn from_default_location() -> Result<Self, CacheBenchError> {
        Self::new("./config")
    }

    /// Returns the loaded configuration.
    #[must_use]
    pub fn get(&self) -> &AppConfig {
        &self.config
    }

    /// Returns the directory the configuration was loaded from.
    #[must_use]
    pub fn config_dir(&self) -> &str {
        &self.config_dir
    }

    /// Consumes the loader, returning the configuration.
    #[must_use]
    pub fn into_inner(self) -> AppConfig {
        self.config
    }

    /// Loads configuration from the specified directory.
    fn load_config(config_dir: &str) -> Result<AppConfig, CacheBenchError> {
        // Load .env file if present
        if let Err(e) = dotenvy::dotenv() {
            debug!("No .env file found or error loading it: {}", e);
        }

        let environment =
            std::env::var("CACHEBENCH_ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        info!("Loading configuration for environment: {}", environment);

        let mut builder = Config::builder()
            .set_default("app.environment", environment.clone())
            .map_err(config_error_to_cachebench_error)?;

        // 1. Load default configuration
        let default_path = format!("{}/default.toml", config_dir);
        if Path::new(&default_path).exists() {
            debug!("Loading default config from: {}", default_path);
            builder = builder.add_source(File::with_name(&default_path).required(false));
        }

        // 2. Load environment-specific configuration
        let env_path = format!("{}/{}.toml", config_dir, environment);
        if Path::new(&env_path).exists() {
            debug!("Loading environment config from: {}", env_path);
            builder = builder.add_source(File::with_name(&env_path).required(false));
        }

        // 3. Load local overrides (not committed to version control)
        let local_path = format!("{}/local.toml", config_dir);
        if Path::new(&local_path).exists() {
            debug!("Loading local config from: {}", local_path);
            builder = builder.add_source(File::with_name(&local_path).required(false));
        }

        // 4. Override with environment variables (CACHEBENCH__ prefix)
        builder = builder.add_source(
            Environment::with_prefix("CACHEBENCH")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_error_to_cachebench_error)?;

        let app_config: AppConfig = config
            .try_deserialize()
            .map_err(config_error_to_cachebench_error)?;

        Self::validate_config(&app_config)?;

        Ok(app_config)
    }

    /// Validates the configuration.
    fn validate_config(config: &AppConfig) -> Result<(), CacheBenchError> {
        if config.cache.key_prefix.is_empty() {
            warn!("Cache key prefix is empty; keys are only namespaced by type");
        }

        if config.redis.enabled {
            if config.redis.address.trim().is_empty() {
                return Err(CacheBenchError::Configuration("Redis address is required".to_string()));
            }

            if config.redis.mode.is_cluster() {
                return Err(CacheBenchError::Configuration(
                    "Redis cluster mode is not supported, use mode = \"single\"".to_string(),
                ));
            }

            if config.redis.pool_size == 0 {
                return Err(CacheBenchError::Configuration(
                    "Redis pool size must be greater than zero".to_string(),
                ));
            }
        }

        if config.bench.fixture_path.trim().is_empty() {
            return Err(CacheBenchError::Configuration("Fixture path is required".to_string()));
        }

        Ok(())
    }
}

fn config_error_to_cachebench_error(err: ConfigError) -> CacheBenchError {
    CacheBenchError::Configuration(err.to_string())
}
