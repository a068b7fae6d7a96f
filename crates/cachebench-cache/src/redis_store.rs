//! Redis-backed cache store.

use crate::{CacheStore, StoreError, StoreResult};
use async_trait::async_trait;
use cachebench_config::RedisConfig;
use cachebench_core::{CacheBenchError, CacheBenchResult};
use deadpool_redis::redis::{self, AsyncCommands, Cmd};
use deadpool_redis::{Config, Pool, Runtime};
use shaku::Component;
use tracing::{debug, info};

/// Create a Redis connection pool and check it answers `PING`.
pub async fn create_pool(config: &RedisConfig) -> CacheBenchResult<Pool> {
    info!(
        address = %config.address,
        mode = %config.mode,
        pool_size = config.pool_size,
        "Creating Redis connection pool..."
    );

    let cfg = Config::from_url(config.connection_url()?);

    let pool = cfg
        .builder()
        .map_err(|e| CacheBenchError::Configuration(format!("Invalid Redis config: {}", e)))?
        .max_size(config.pool_size)
        .create_timeout(Some(config.connect_timeout()))
        .wait_timeout(Some(config.connect_timeout()))
        .runtime(Runtime::Tokio1)
        .build()
        .map_err(|e| CacheBenchError::Configuration(format!("Failed to create pool: {}", e)))?;

    // Test connection
    let mut conn = pool
        .get()
        .await
        .map_err(|e| CacheBenchError::cache(StoreError::from(e)))?;
    redis::cmd("PING")
        .query_async::<String>(&mut conn)
        .await
        .map_err(|e| CacheBenchError::cache(StoreError::from(e)))?;

    info!("Redis connection pool created successfully");

    Ok(pool)
}

/// Build a `SET key value [NX] [EX secs]` command.
fn set_command(key: &str, value: &str, ttl_secs: Option<u64>, only_if_absent: bool) -> Cmd {
    let mut command = redis::cmd("SET");
    command.arg(key).arg(value);
    if only_if_absent {
        command.arg("NX");
    }
    if let Some(ttl) = ttl_secs {
        command.arg("EX").arg(ttl);
    }
    command
}

/// Redis-based cache store.
#[derive(Component)]
#[shaku(interface = CacheStore)]
pub struct RedisCacheStore {
    /// Redis connection pool.
    pool: Option<Pool>,
    /// Refuse writes.
    read_only: bool,
    /// Wrap batch pipelines in MULTI/EXEC.
    atomic_batches: bool,
}

impl RedisCacheStore {
    /// Create a new Redis cache store.
    #[must_use]
    pub fn new(pool: Pool, config: &RedisConfig) -> Self {
        Self {
            pool: Some(pool),
            read_only: config.read_only,
            atomic_batches: config.atomic_batches,
        }
    }

    /// Component parameters for building a DI module around `pool`.
    #[must_use]
    pub fn parameters(pool: Pool, config: &RedisConfig) -> RedisCacheStoreParameters {
        RedisCacheStoreParameters {
            pool: Some(pool),
            read_only: config.read_only,
            atomic_batches: config.atomic_batches,
        }
    }

    /// Get a connection from the pool.
    async fn get_conn(&self) -> StoreResult<deadpool_redis::Connection> {
        match &self.pool {
            Some(pool) => Ok(pool.get().await?),
            None => Err(StoreError::NotConnected),
        }
    }

    fn ensure_writable(&self) -> StoreResult<()> {
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let mut conn = self.get_conn().await?;
        let value: Option<String> = conn.get(key).await?;

        match &value {
            Some(_) => debug!("Cache hit for key '{}'", key),
            None => debug!("Cache miss for key '{}'", key),
        }

        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> StoreResult<()> {
        self.ensure_writable()?;

        let mut conn = self.get_conn().await?;
        set_command(key, value, ttl_secs, false)
            .query_async::<()>(&mut conn)
            .await?;

        debug!(key = %key, ttl_secs = ?ttl_secs, "Cached key");
        Ok(())
    }

    async fn set_many(
        &self,
        entries: &[(String, String)],
        ttl_secs: Option<u64>,
        only_if_absent: bool,
    ) -> StoreResult<()> {
        self.ensure_writable()?;

        if entries.is_empty() {
            return Ok(());
        }

        let mut pipeline = redis::pipe();
        if self.atomic_batches {
            pipeline.atomic();
        }
        for (key, value) in entries {
            pipeline
                .add_command(set_command(key, value, ttl_secs, only_if_absent))
                .ignore();
        }

        let mut conn = self.get_conn().await?;
        pipeline.query_async::<()>(&mut conn).await?;

        debug!(
            count = entries.len(),
            ttl_secs = ?ttl_secs,
            only_if_absent,
            atomic = self.atomic_batches,
            "Pipelined batch write"
        );
        Ok(())
    }

    async fn get_many(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = self.get_conn().await?;
        // Explicit MGET: the typed `mget` helper degrades to GET for one key
        let values: Vec<Option<String>> = redis::cmd("MGET")
            .arg(keys)
            .query_async(&mut conn)
            .await?;

        debug!(
            requested = keys.len(),
            hits = values.iter().filter(|v| v.is_some()).count(),
            "Batch read"
        );
        Ok(values)
    }

    async fn remove_many(&self, keys: &[String]) -> StoreResult<u64> {
        self.ensure_writable()?;

        if keys.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn().await?;
        let deleted: u64 = redis::cmd("DEL").arg(keys).query_async(&mut conn).await?;

        debug!(requested = keys.len(), deleted, "Deleted keys");
        Ok(deleted)
    }

    async fn ping(&self) -> StoreResult<()> {
        let mut conn = self.get_conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close();
            info!("Redis connection pool closed");
        }
    }

    fn name(&self) -> &'static str {
        "redis"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disconnected(read_only: bool) -> RedisCacheStore {
        RedisCacheStore {
            pool: None,
            read_only,
            atomic_batches: false,
        }
    }

    #[test]
    fn test_set_command_plain() {
        let packed = set_command("k", "v", None, false).get_packed_command();
        assert_eq!(packed, b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n".to_vec());
    }

    #[test]
    fn test_set_command_nx_with_ttl() {
        let packed = set_command("k", "v", Some(5), true).get_packed_command();
        assert_eq!(
            packed,
            b"*6\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\nv\r\n$2\r\nNX\r\n$2\r\nEX\r\n$1\r\n5\r\n".to_vec()
        );
    }

    #[tokio::test]
    async fn test_without_pool_reports_not_connected() {
        let store = disconnected(false);
        let err = store.get("k").await.unwrap_err();
        assert!(matches!(err, StoreError::NotConnected));
    }

    #[tokio::test]
    async fn test_read_only_refuses_writes() {
        let store = disconnected(true);
        assert!(matches!(store.set("k", "v", None).await, Err(StoreError::ReadOnly)));
        assert!(matches!(
            store.set_many(&[("k".to_string(), "v".to_string())], None, false).await,
            Err(StoreError::ReadOnly)
        ));
        assert!(matches!(
            store.remove_many(&["k".to_string()]).await,
            Err(StoreError::ReadOnly)
        ));
    }

    #[tokio::test]
    async fn test_empty_batches_skip_the_server() {
        let store = disconnected(false);
        assert!(store.get_many(&[]).await.unwrap().is_empty());
        assert_eq!(store.remove_many(&[]).await.unwrap(), 0);
        store.set_many(&[], Some(10), true).await.unwrap();
    }
}
