//! In-process cache store.
//!
//! Used when Redis is disabled and by tests. Expired entries are dropped
//! lazily when touched.

use crate::{CacheStore, StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn new(value: &str, ttl_secs: Option<u64>) -> Self {
        Self {
            value: value.to_string(),
            expires_at: ttl_secs.map(|secs| Instant::now() + Duration::from_secs(secs)),
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Cache store keeping entries in a process-local map.
#[derive(Debug, Default)]
pub struct InMemoryCacheStore {
    entries: Mutex<HashMap<String, Entry>>,
    closed: AtomicBool,
}

impl InMemoryCacheStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.is_live(now)).count()
    }

    /// Returns true if no live entries remain.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remaining TTL of a live entry, `None` if missing or persistent.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.expires_at)
            .map(|at| at.saturating_duration_since(now))
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn write(
        entries: &mut HashMap<String, Entry>,
        key: &str,
        value: &str,
        ttl_secs: Option<u64>,
        only_if_absent: bool,
        now: Instant,
    ) -> bool {
        if only_if_absent && entries.get(key).is_some_and(|e| e.is_live(now)) {
            return false;
        }
        entries.insert(key.to_string(), Entry::new(value, ttl_secs));
        true
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.ensure_open()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();

        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: Option<u64>) -> StoreResult<()> {
        self.ensure_open()?;
        let mut entries = self.entries.lock();
        Self::write(&mut entries, key, value, ttl_secs, false, Instant::now());
        Ok(())
    }

    async fn set_many(
        &self,
        items: &[(String, String)],
        ttl_secs: Option<u64>,
        only_if_absent: bool,
    ) -> StoreResult<()> {
        self.ensure_open()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let written = items
            .iter()
            .filter(|(key, value)| Self::write(&mut entries, key, value, ttl_secs, only_if_absent, now))
            .count();

        debug!(requested = items.len(), written, "In-memory batch write");
        Ok(())
    }

    async fn get_many(&self, keys: &[String]) -> StoreResult<Vec<Option<String>>> {
        self.ensure_open()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();

        Ok(keys
            .iter()
            .map(|key| match entries.get(key) {
                Some(entry) if entry.is_live(now) => Some(entry.value.clone()),
                Some(_) => {
                    entries.remove(key);
                    None
                }
                None => None,
            })
            .collect())
    }

    async fn remove_many(&self, keys: &[String]) -> StoreResult<u64> {
        self.ensure_open()?;
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let removed = keys
            .iter()
            .filter_map(|key| entries.remove(key))
            .filter(|e| e.is_live(now))
            .count();

        Ok(removed as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.ensure_open()
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.entries.lock().clear();
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
