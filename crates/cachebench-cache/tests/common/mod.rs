//! Common test infrastructure for Redis integration tests.

use cachebench_cache::{create_pool, RedisCacheStore};
use cachebench_config::RedisConfig;
use deadpool_redis::Pool;
use std::sync::Arc;
use testcontainers::{runners::AsyncRunner, ContainerAsync};
use testcontainers_modules::redis::{Redis, REDIS_PORT};

/// Test Redis container wrapper.
///
/// Manages a Redis testcontainer lifecycle and provides a connection pool.
pub struct TestRedis {
    _container: ContainerAsync<Redis>,
    pool: Pool,
    config: RedisConfig,
}

impl TestRedis {
    /// Starts a fresh Redis container and connects a pool to it.
    pub async fn new() -> Self {
        Self::with_config(RedisConfig::default()).await
    }

    /// Starts a fresh Redis container, overriding the address of `config`.
    pub async fn with_config(mut config: RedisConfig) -> Self {
        let container = Redis::default()
            .start()
            .await
            .expect("Failed to start Redis container");

        let port = container
            .get_host_port_ipv4(REDIS_PORT)
            .await
            .expect("Failed to get Redis port");

        config.address = format!("127.0.0.1:{}", port);
        config.pool_size = 4;

        let pool = create_pool(&config)
            .await
            .expect("Failed to connect to Redis");

        Self {
            _container: container,
            pool,
            config,
        }
    }

    /// Returns a store over the container.
    pub fn store(&self) -> Arc<RedisCacheStore> {
        Arc::new(RedisCacheStore::new(self.pool.clone(), &self.config))
    }

    /// Returns a store built from `config` but sharing the container's pool.
    pub fn store_with(&self, config: &RedisConfig) -> Arc<RedisCacheStore> {
        Arc::new(RedisCacheStore::new(self.pool.clone(), config))
    }

    /// Returns the raw pool for assertions.
    pub fn pool(&self) -> &Pool {
        &self.pool
    }
}
