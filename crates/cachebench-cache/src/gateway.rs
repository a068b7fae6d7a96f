//! Typed distributed cache over a [`CacheStore`].

use crate::keys::KeyNormalizer;
use crate::{CacheEntryOptions, CacheError, CacheOperation, CacheResult, CacheStore, Expiry, StoreError};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::debug;

/// A value that can live in a [`DistributedCache`].
pub trait CacheItem: Serialize + DeserializeOwned + Send + Sync {
    /// Type name used in the `c:` segment of every key.
    const CACHE_NAME: &'static str;
}

/// Typed cache gateway.
///
/// Keys handed in are identity keys; they are normalized to
/// `c:<T::CACHE_NAME>,k:<prefix><key>` for reads, writes and deletes alike.
/// Errors from the store or from JSON encoding come back as a [`CacheError`]
/// naming the operation.
pub struct DistributedCache<T> {
    store: Arc<dyn CacheStore>,
    keys: KeyNormalizer,
    _item: PhantomData<fn() -> T>,
}

impl<T> Clone for DistributedCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            keys: self.keys.clone(),
            _item: PhantomData,
        }
    }
}

impl<T: CacheItem> DistributedCache<T> {
    /// Create a gateway writing through `store` with the deployment `key_prefix`.
    pub fn new(store: Arc<dyn CacheStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            keys: KeyNormalizer::new(T::CACHE_NAME, key_prefix),
            _item: PhantomData,
        }
    }

    /// The key builder used by this gateway.
    #[must_use]
    pub fn key_normalizer(&self) -> &KeyNormalizer {
        &self.keys
    }

    /// The store behind this gateway.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Write one value.
    ///
    /// Options that have already expired remove the key instead.
    pub async fn set(&self, key: &str, value: &T, options: Option<&CacheEntryOptions>) -> CacheResult<()> {
        let op = CacheOperation::Set;
        let normalized = self.keys.normalize(key);

        match Expiry::resolve(options, Utc::now()) {
            Expiry::Elapsed => {
                self.store
                    .remove_many(std::slice::from_ref(&normalized))
                    .await
                    .map_err(|e| op.error(e))?;
                debug!(key = %normalized, "Expiration already passed, key removed");
            }
            expiry => {
                let json = serde_json::to_string(value).map_err(|e| op.error(e))?;
                self.store
                    .set(&normalized, &json, expiry.ttl_secs())
                    .await
                    .map_err(|e| op.error(e))?;
            }
        }

        Ok(())
    }

    /// Read one value. Returns `None` when the key is absent or expired.
    pub async fn get(&self, key: &str) -> CacheResult<Option<T>> {
        let op = CacheOperation::Get;
        let normalized = self.keys.normalize(key);

        let raw = self.store.get(&normalized).await.map_err(|e| op.error(e))?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(|e| op.error(e))
    }

    /// Remove one value. Returns `true` if it existed.
    pub async fn remove(&self, key: &str) -> CacheResult<bool> {
        let op = CacheOperation::Remove;
        let normalized = self.keys.normalize(key);

        let removed = self
            .store
            .remove_many(std::slice::from_ref(&normalized))
            .await
            .map_err(|e| op.error(e))?;

        Ok(removed > 0)
    }

    /// Write many values in one pipelined batch, sharing one expiration.
    ///
    /// With `ignore_if_exists`, keys already present keep their value. The
    /// batch is not atomic: a failure part-way may leave some entries written.
    /// Options that have already expired remove every key, or do nothing when
    /// `ignore_if_exists` is set.
    pub async fn set_many(
        &self,
        items: &[(String, T)],
        options: Option<&CacheEntryOptions>,
        ignore_if_exists: bool,
    ) -> CacheResult<()> {
        let op = CacheOperation::SetMany;

        if items.is_empty() {
            return Ok(());
        }

        match Expiry::resolve(options, Utc::now()) {
            Expiry::Elapsed if ignore_if_exists => {
                debug!(count = items.len(), "Expiration already passed, batch skipped");
            }
            Expiry::Elapsed => {
                let keys = self.keys.normalize_all(items.iter().map(|(key, _)| key.as_str()));
                self.store.remove_many(&keys).await.map_err(|e| op.error(e))?;
                debug!(count = keys.len(), "Expiration already passed, keys removed");
            }
            expiry => {
                let entries = items
                    .iter()
                    .map(|(key, value)| Ok((self.keys.normalize(key), serde_json::to_string(value)?)))
                    .collect::<Result<Vec<_>, serde_json::Error>>()
                    .map_err(|e| op.error(e))?;

                self.store
                    .set_many(&entries, expiry.ttl_secs(), ignore_if_exists)
                    .await
                    .map_err(|e| op.error(e))?;
            }
        }

        Ok(())
    }

    /// Read many values with one multi-get.
    ///
    /// The result has one entry per input key, in input order, pairing the
    /// original key with its value or `None` on a miss.
    pub async fn get_many(&self, keys: &[String]) -> CacheResult<Vec<(String, Option<T>)>> {
        let op = CacheOperation::GetMany;

        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let normalized = self.keys.normalize_all(keys.iter().map(String::as_str));
        let values = self.store.get_many(&normalized).await.map_err(|e| op.error(e))?;

        if values.len() != keys.len() {
            return Err(op.error(StoreError::LengthMismatch {
                expected: keys.len(),
                actual: values.len(),
            }));
        }

        keys.iter()
            .zip(values)
            .map(|(key, raw)| {
                let value = raw.map(|json| serde_json::from_str(&json)).transpose()?;
                Ok((key.clone(), value))
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()
            .map_err(|e| op.error(e))
    }

    /// Remove many values with one multi-key delete. Returns how many existed.
    pub async fn remove_many(&self, keys: &[String]) -> CacheResult<u64> {
        let op = CacheOperation::RemoveMany;

        if keys.is_empty() {
            return Ok(0);
        }

        let normalized = self.keys.normalize_all(keys.iter().map(String::as_str));
        self.store.remove_many(&normalized).await.map_err(|e| op.error(e))
    }

    /// Read many values, filling misses from `factory`.
    ///
    /// `factory` receives only the missing keys. Whatever it returns is
    /// written with `ignore_if_exists` so concurrent writers are not
    /// clobbered. Keys the factory does not produce stay `None`.
    pub async fn get_or_add_many<F, Fut>(
        &self,
        keys: &[String],
        factory: F,
        options: Option<&CacheEntryOptions>,
    ) -> CacheResult<Vec<(String, Option<T>)>>
    where
        T: Clone,
        F: FnOnce(Vec<String>) -> Fut,
        Fut: Future<Output = Vec<(String, T)>>,
    {
        let op = CacheOperation::GetOrAddMany;

        let mut results = self
            .get_many(keys)
            .await
            .map_err(|e| CacheError::new(op, e.source))?;

        let missing: Vec<String> = results
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(key, _)| key.clone())
            .collect();

        if missing.is_empty() {
            return Ok(results);
        }

        debug!(missing = missing.len(), requested = keys.len(), "Filling cache misses");

        let added = factory(missing).await;
        self.set_many(&added, options, true)
            .await
            .map_err(|e| CacheError::new(op, e.source))?;

        let added: HashMap<String, T> = added.into_iter().collect();
        for (key, value) in &mut results {
            if value.is_none() {
                *value = added.get(key).cloned();
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{InMemoryCacheStore, StoreResult};
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use serde::Deserialize;
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Reading {
        device: String,
        value: String,
    }

    impl CacheItem for Reading {
        const CACHE_NAME: &'static str = "Reading";
    }

    fn reading(device: &str, value: &str) -> Reading {
        Reading {
            device: device.to_string(),
            value: value.to_string(),
        }
    }

    fn setup() -> (Arc<InMemoryCacheStore>, DistributedCache<Reading>) {
        let store = Arc::new(InMemoryCacheStore::new());
        let cache = DistributedCache::new(store.clone() as Arc<dyn CacheStore>, "test:");
        (store, cache)
    }

    fn five_minutes() -> CacheEntryOptions {
        CacheEntryOptions::absolute(Utc::now() + ChronoDuration::minutes(5))
    }

    /// Store whose every call fails.
    struct BrokenStore;

    #[async_trait]
    impl CacheStore for BrokenStore {
        async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Err(StoreError::Closed)
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Option<u64>) -> StoreResult<()> {
            Err(StoreError::Closed)
        }
        async fn set_many(&self, _e: &[(String, String)], _ttl: Option<u64>, _nx: bool) -> StoreResult<()> {
            Err(StoreError::Closed)
        }
        async fn get_many(&self, _keys: &[String]) -> StoreResult<Vec<Option<String>>> {
            Err(StoreError::Closed)
        }
        async fn remove_many(&self, _keys: &[String]) -> StoreResult<u64> {
            Err(StoreError::Closed)
        }
        async fn ping(&self) -> StoreResult<()> {
            Err(StoreError::Closed)
        }
        async fn close(&self) {}
        fn name(&self) -> &'static str {
            "broken"
        }
    }

    /// Store answering every batch read with no values.
    struct ShortReadStore;

    #[async_trait]
    impl CacheStore for ShortReadStore {
        async fn get(&self, _key: &str) -> StoreResult<Option<String>> {
            Ok(None)
        }
        async fn set(&self, _key: &str, _value: &str, _ttl: Option<u64>) -> StoreResult<()> {
            Ok(())
        }
        async fn set_many(&self, _e: &[(String, String)], _ttl: Option<u64>, _nx: bool) -> StoreResult<()> {
            Ok(())
        }
        async fn get_many(&self, _keys: &[String]) -> StoreResult<Vec<Option<String>>> {
            Ok(Vec::new())
        }
        async fn remove_many(&self, _keys: &[String]) -> StoreResult<u64> {
            Ok(0)
        }
        async fn ping(&self) -> StoreResult<()> {
            Ok(())
        }
        async fn close(&self) {}
        fn name(&self) -> &'static str {
            "short"
        }
    }

    #[tokio::test]
    async fn test_set_then_get_round_trips() {
        let (store, cache) = setup();
        let value = reading("D1", "123.45");

        cache.set("E1,D1", &value, Some(&five_minutes())).await.unwrap();

        assert_eq!(cache.get("E1,D1").await.unwrap(), Some(value));
        let ttl = store.ttl("c:Reading,k:test:E1,D1").expect("ttl should be set");
        assert!(ttl > Duration::from_secs(290));
    }

    #[tokio::test]
    async fn test_values_stored_under_normalized_key_as_json() {
        let (store, cache) = setup();
        cache.set("k1", &reading("D1", "1"), None).await.unwrap();

        let raw = store.get("c:Reading,k:test:k1").await.unwrap().unwrap();
        assert_eq!(raw, r#"{"device":"D1","value":"1"}"#);
        assert_eq!(store.ttl("c:Reading,k:test:k1"), None);
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let (_, cache) = setup();
        assert_eq!(cache.get("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_with_elapsed_expiration_removes_key() {
        let (store, cache) = setup();
        cache.set("k", &reading("D1", "old"), None).await.unwrap();

        let past = CacheEntryOptions::absolute(Utc::now() - ChronoDuration::seconds(1));
        cache.set("k", &reading("D1", "new"), Some(&past)).await.unwrap();

        assert_eq!(cache.get("k").await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_set_many_ignore_if_exists_keeps_existing() {
        let (_, cache) = setup();
        cache.set("a", &reading("A", "original"), None).await.unwrap();

        let items = vec![
            ("a".to_string(), reading("A", "replacement")),
            ("b".to_string(), reading("B", "fresh")),
        ];
        cache.set_many(&items, Some(&five_minutes()), true).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), Some(reading("A", "original")));
        assert_eq!(cache.get("b").await.unwrap(), Some(reading("B", "fresh")));
    }

    #[tokio::test]
    async fn test_set_many_overwrites_by_default() {
        let (_, cache) = setup();
        cache.set("a", &reading("A", "original"), None).await.unwrap();

        let items = vec![("a".to_string(), reading("A", "replacement"))];
        cache.set_many(&items, None, false).await.unwrap();

        assert_eq!(cache.get("a").await.unwrap(), Some(reading("A", "replacement")));
    }

    #[tokio::test]
    async fn test_set_many_with_elapsed_expiration() {
        let (store, cache) = setup();
        cache.set("a", &reading("A", "original"), None).await.unwrap();
        let past = CacheEntryOptions::absolute(Utc::now() - ChronoDuration::seconds(1));
        let items = vec![
            ("a".to_string(), reading("A", "replacement")),
            ("b".to_string(), reading("B", "fresh")),
        ];

        cache.set_many(&items, Some(&past), true).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap(), Some(reading("A", "original")));
        assert_eq!(store.len(), 1);

        cache.set_many(&items, Some(&past), false).await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_get_many_preserves_input_order() {
        let (_, cache) = setup();
        cache.set("b", &reading("B", "2"), None).await.unwrap();
        cache.set("d", &reading("D", "4"), None).await.unwrap();

        let keys: Vec<String> = ["d", "a", "b", "c"].iter().map(|s| (*s).to_string()).collect();
        let results = cache.get_many(&keys).await.unwrap();

        let returned_keys: Vec<&str> = results.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(returned_keys, vec!["d", "a", "b", "c"]);
        assert_eq!(results[0].1, Some(reading("D", "4")));
        assert_eq!(results[1].1, None);
        assert_eq!(results[2].1, Some(reading("B", "2")));
        assert_eq!(results[3].1, None);
    }

    #[tokio::test]
    async fn test_remove_many_then_get_many_is_absent() {
        let (_, cache) = setup();
        let items = vec![
            ("a".to_string(), reading("A", "1")),
            ("b".to_string(), reading("B", "2")),
        ];
        cache.set_many(&items, None, false).await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string()];
        assert_eq!(cache.remove_many(&keys).await.unwrap(), 2);

        let results = cache.get_many(&keys).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|(_, value)| value.is_none()));
    }

    #[tokio::test]
    async fn test_remove_single() {
        let (_, cache) = setup();
        cache.set("a", &reading("A", "1"), None).await.unwrap();
        assert!(cache.remove("a").await.unwrap());
        assert!(!cache.remove("a").await.unwrap());
    }

    #[tokio::test]
    async fn test_caches_with_different_types_do_not_collide() {
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        struct Other(u32);
        impl CacheItem for Other {
            const CACHE_NAME: &'static str = "Other";
        }

        let store: Arc<dyn CacheStore> = Arc::new(InMemoryCacheStore::new());
        let readings = DistributedCache::<Reading>::new(store.clone(), "p");
        let others = DistributedCache::<Other>::new(store, "p");

        readings.set("same", &reading("A", "1"), None).await.unwrap();
        others.set("same", &Other(7), None).await.unwrap();

        assert_eq!(readings.get("same").await.unwrap(), Some(reading("A", "1")));
        assert_eq!(others.get("same").await.unwrap(), Some(Other(7)));
    }

    #[tokio::test]
    async fn test_get_or_add_many_only_builds_missing() {
        let (_, cache) = setup();
        cache.set("a", &reading("A", "cached"), None).await.unwrap();

        let keys = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let results = cache
            .get_or_add_many(
                &keys,
                |missing| {
                    assert_eq!(missing, vec!["b".to_string(), "c".to_string()]);
                    std::future::ready(vec![("b".to_string(), reading("B", "built"))])
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(results[0], ("a".to_string(), Some(reading("A", "cached"))));
        assert_eq!(results[1], ("b".to_string(), Some(reading("B", "built"))));
        assert_eq!(results[2], ("c".to_string(), None));
        assert_eq!(cache.get("b").await.unwrap(), Some(reading("B", "built")));
    }

    #[tokio::test]
    async fn test_get_or_add_many_skips_factory_when_all_hit() {
        let (_, cache) = setup();
        cache.set("a", &reading("A", "cached"), None).await.unwrap();

        let results = cache
            .get_or_add_many(
                &["a".to_string()],
                |_| -> std::future::Ready<Vec<(String, Reading)>> { panic!("factory must not run") },
                None,
            )
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
    }

    #[tokio::test]
    async fn test_errors_name_the_operation() {
        let cache = DistributedCache::<Reading>::new(Arc::new(BrokenStore), "p");
        let keys = vec!["a".to_string()];
        let items = vec![("a".to_string(), reading("A", "1"))];

        let err = cache.set("a", &reading("A", "1"), None).await.unwrap_err();
        assert_eq!(err.operation, CacheOperation::Set);

        let err = cache.get("a").await.unwrap_err();
        assert_eq!(err.operation, CacheOperation::Get);

        let err = cache.set_many(&items, None, true).await.unwrap_err();
        assert_eq!(err.operation, CacheOperation::SetMany);

        let err = cache.get_many(&keys).await.unwrap_err();
        assert_eq!(err.operation, CacheOperation::GetMany);
        assert_eq!(err.to_string(), "GetMany failed: Store is closed");

        let err = cache.remove_many(&keys).await.unwrap_err();
        assert_eq!(err.operation, CacheOperation::RemoveMany);

        let err = cache
            .get_or_add_many(&keys, |_| std::future::ready(Vec::new()), None)
            .await
            .unwrap_err();
        assert_eq!(err.operation, CacheOperation::GetOrAddMany);
    }

    #[tokio::test]
    async fn test_short_batch_read_is_a_length_mismatch() {
        let cache = DistributedCache::<Reading>::new(Arc::new(ShortReadStore), "p");
        let keys = vec!["a".to_string(), "b".to_string()];

        let err = cache.get_many(&keys).await.unwrap_err();
        assert_eq!(err.operation, CacheOperation::GetMany);
        assert!(matches!(
            err.source,
            StoreError::LengthMismatch { expected: 2, actual: 0 }
        ));

        let err = cache
            .get_or_add_many(&keys, |_| std::future::ready(Vec::new()), None)
            .await
            .unwrap_err();
        assert_eq!(err.operation, CacheOperation::GetOrAddMany);
        assert!(matches!(err.source, StoreError::LengthMismatch { .. }));
    }

    #[tokio::test]
    async fn test_undecodable_value_is_a_get_error() {
        let (store, cache) = setup();
        store.set("c:Reading,k:test:bad", "not json", None).await.unwrap();

        let err = cache.get("bad").await.unwrap_err();
        assert_eq!(err.operation, CacheOperation::Get);
        assert!(matches!(err.source, StoreError::Serialization(_)));
    }

    #[tokio::test]
    async fn test_empty_batches_are_no_ops() {
        let cache = DistributedCache::<Reading>::new(Arc::new(BrokenStore), "p");
        assert!(cache.get_many(&[]).await.unwrap().is_empty());
        assert_eq!(cache.remove_many(&[]).await.unwrap(), 0);
        cache.set_many(&[], None, false).await.unwrap();
    }
}
