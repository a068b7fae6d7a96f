//! Startup logging.

use cachebench_config::{AppConfig, ConfigLoader};
use cachebench_core::{with_bootstrap_logging, CacheBenchResult};
use tracing::info;

/// Loads configuration from `config_dir`.
///
/// Runs before the configured subscriber exists, so loader events go through
/// a default bootstrap subscriber.
pub fn load_config(config_dir: &str) -> CacheBenchResult<ConfigLoader> {
    with_bootstrap_logging(|| ConfigLoader::new(config_dir))
}

/// Prints the startup banner.
pub fn print_banner() {
    info!(r#"
                 __         __                    __
  _________ ____/ /_  ___  / /_  ___  ____  _____/ /_
 / ___/ __ `/ ___/ __ \/ _ \/ __ \/ _ \/ __ \/ ___/ __ \
/ /__/ /_/ / /__/ / / /  __/ /_/ /  __/ / / / /__/ / / /
\___/\__,_/\___/_/ /_/\___/_.___/\___/_/ /_/\___/_/ /_/
    "#);
}

/// Prints what the run is about to do.
pub fn print_startup_info(config: &AppConfig, store_name: &str) {
    let separator = "=".repeat(60);
    info!("{}", separator);
    info!("Application: {} v{} ({})", config.app.name, config.app.version, config.app.environment);
    info!("Store:       {}", store_name);
    if config.redis.enabled {
        info!(
            "Redis:       {} db={} mode={} read_only={}",
            config.redis.address, config.redis.database, config.redis.mode, config.redis.read_only
        );
    }
    info!("Key prefix:  {:?}", config.cache.key_prefix);
    info!("Fixture:     {}", config.bench.fixture_path);
    info!("Category:    {}", config.bench.specialty_category);
    info!("{}", separator);
}
