//! Dependency injection module using Shaku.
//!
//! `RedisCacheModule` owns the Redis-backed store. When Redis is disabled the
//! in-process store is used directly and no module is built.

use cachebench_cache::{create_pool, CacheStore, InMemoryCacheStore, RedisCacheStore};
use cachebench_config::RedisConfig;
use cachebench_core::{module, CacheBenchResult, HasComponent};
use std::sync::Arc;
use tracing::info;

// Redis-backed cache store behind the `CacheStore` interface.
module! {
    pub RedisCacheModule {
        components = [RedisCacheStore],
        providers = [],
    }
}

/// Builds the Redis module, opening and checking the connection pool.
pub async fn build_redis_module(config: &RedisConfig) -> CacheBenchResult<Arc<RedisCacheModule>> {
    let pool = create_pool(config).await?;

    let module = RedisCacheModule::builder()
        .with_component_parameters::<RedisCacheStore>(RedisCacheStore::parameters(pool, config))
        .build();

    Ok(Arc::new(module))
}

/// Builds the cache store selected by configuration.
pub async fn build_cache_store(config: &RedisConfig) -> CacheBenchResult<Arc<dyn CacheStore>> {
    if !config.enabled {
        info!("Redis disabled, using in-memory cache store");
        return Ok(Arc::new(InMemoryCacheStore::new()));
    }

    let module = build_redis_module(config).await?;
    Ok(module.cache_store())
}

// ============================================================================
// Component Accessors
// ============================================================================

/// Trait for accessing the cache store from a module.
pub trait CacheStoreProvider {
    fn cache_store(&self) -> Arc<dyn CacheStore>;
}

impl CacheStoreProvider for RedisCacheModule {
    fn cache_store(&self) -> Arc<dyn CacheStore> {
        self.resolve()
    }
}
