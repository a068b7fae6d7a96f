//! Store interface behind the cache gateway.

use crate::StoreResult;
use async_trait::async_trait;
use cachebench_core::Interface;

/// Raw key-value store the gateway writes through.
///
/// Keys passed here are already normalized and values are JSON text, which
/// keeps the trait dyn-compatible. A `ttl_secs` of `None` persists the entry.
#[async_trait]
pub trait CacheStore: Interface + Send + Sync {
    /// Get a raw value. Returns `None` if the key doesn't exist or has expired.
    async fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set a raw value unconditionally.
    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> StoreResult<()>;

    /// Write many entries in one batch, sharing one TTL.
    ///
    /// With `only_if_absent`, existing keys are left untouched. The batch is
    /// not required to be atomic.
    async fn set_many(
        &self,
        entries: &[(String, String)],
        ttl_secs: Option<u64>,
        only_if_absent: bool,
    ) -> StoreResult<()>;

    /// Get many raw values, one slot per key in input order.
    async fn get_many(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>>;

    /// Delete keys. Returns the number of keys that existed.
    async fn remove_many(&self, keys: &[String]) -> StoreResult<u64>;

    /// Check the store is reachable.
    async fn ping(&self) -> StoreResult<()>;

    /// Release the underlying connections. Later calls fail.
    async fn close(&self);

    /// Short name for logs.
    fn name(&self) -> &'static str;
}
