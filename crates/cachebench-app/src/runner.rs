//! Timed benchmark run over the cache gateway.

use crate::domain::{RealtimeOnline, SpecialtyCategory};
use crate::fixture::Fixture;
use cachebench_cache::{CacheEntryOptions, DistributedCache};
use cachebench_config::BenchConfig;
use cachebench_core::{CacheBenchError, CacheBenchResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::future;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Benchmark steps, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BenchStep {
    Cleanup,
    Set,
    Get,
    SetMany,
    GetMany,
    GetOrAddMany,
    FinalCleanup,
}

impl BenchStep {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cleanup => "cleanup",
            Self::Set => "set",
            Self::Get => "get",
            Self::SetMany => "set_many",
            Self::GetMany => "get_many",
            Self::GetOrAddMany => "get_or_add_many",
            Self::FinalCleanup => "final_cleanup",
        }
    }
}

/// Timing of one step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepTiming {
    pub name: String,
    pub elapsed_ms: f64,
    pub items: usize,
}

/// Result of a full run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchReport {
    pub store: String,
    pub key_prefix: String,
    pub records: usize,
    pub distinct_keys: usize,
    /// Misses the GetOrAddMany step wrote back.
    #[serde(default)]
    pub filled: usize,
    pub steps: Vec<StepTiming>,
}

impl BenchReport {
    fn record(&mut self, step: BenchStep, elapsed: Duration, items: usize) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        info!(step = step.as_str(), elapsed_ms, items, "Step finished");
        self.steps.push(StepTiming {
            name: step.as_str().to_string(),
            elapsed_ms,
            items,
        });
    }

    /// Total time across all steps.
    #[must_use]
    pub fn total_ms(&self) -> f64 {
        self.steps.iter().map(|s| s.elapsed_ms).sum()
    }

    pub fn log_summary(&self) {
        info!("========================================");
        info!("Store: {}  Prefix: {:?}", self.store, self.key_prefix);
        info!("Records: {}  Distinct keys: {}  Filled: {}", self.records, self.distinct_keys, self.filled);
        for step in &self.steps {
            info!("  {:<16} {:>10.3} ms  ({} items)", step.name, step.elapsed_ms, step.items);
        }
        info!("Total: {:.3} ms", self.total_ms());
        info!("========================================");
    }

    /// Write the report as pretty JSON.
    pub async fn write_json(&self, path: impl AsRef<Path>) -> CacheBenchResult<()> {
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| CacheBenchError::internal(format!("Failed to write report {}: {}", path.display(), e)))?;
        info!(path = %path.display(), "Report written");
        Ok(())
    }
}

/// Build records for every fixture item.
#[must_use]
pub fn build_records(
    fixture: &Fixture,
    category: SpecialtyCategory,
    record_value: &str,
    now: DateTime<Utc>,
) -> Vec<RealtimeOnline> {
    fixture
        .items
        .iter()
        .map(|item| RealtimeOnline::from_fixture(item, category, record_value, now))
        .collect()
}

/// Identity keys of `records`, first occurrence wins.
#[must_use]
pub fn distinct_keys(records: &[RealtimeOnline]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(records.len());
    records
        .iter()
        .map(RealtimeOnline::cache_key)
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

/// Runs the benchmark steps against one gateway.
pub struct BenchmarkRunner {
    cache: DistributedCache<RealtimeOnline>,
    category: SpecialtyCategory,
    config: BenchConfig,
}

impl BenchmarkRunner {
    /// Create a runner. Fails if the configured category is unknown.
    pub fn new(cache: DistributedCache<RealtimeOnline>, config: BenchConfig) -> CacheBenchResult<Self> {
        let category: SpecialtyCategory = config.specialty_category.parse()?;
        Ok(Self {
            cache,
            category,
            config,
        })
    }

    fn entry_options(&self) -> Option<CacheEntryOptions> {
        if self.config.expiration_secs == 0 {
            return None;
        }
        Some(CacheEntryOptions::relative(self.config.expiration()))
    }

    /// Run every step in order and collect the timings.
    pub async fn run(&self, fixture: &Fixture) -> CacheBenchResult<BenchReport> {
        let records = build_records(fixture, self.category, &self.config.record_value, Utc::now());
        let first = records
            .first()
            .cloned()
            .ok_or_else(|| CacheBenchError::fixture(&self.config.fixture_path, "fixture contains no items"))?;
        let keys = distinct_keys(&records);

        let mut report = BenchReport {
            store: self.cache.store().name().to_string(),
            key_prefix: self.cache.key_normalizer().key_prefix().to_string(),
            records: records.len(),
            distinct_keys: keys.len(),
            filled: 0,
            steps: Vec::with_capacity(7),
        };

        if let Some(options) = self.entry_options() {
            info!(ttl_secs = options.ttl_seconds(Utc::now()), "Entries expire after");
        }
        info!(records = records.len(), distinct_keys = keys.len(), "Starting benchmark");

        let started = Instant::now();
        let removed = self.cache.remove_many(&keys).await?;
        debug!(removed, "Stale entries removed");
        report.record(BenchStep::Cleanup, started.elapsed(), keys.len());

        let first_key = first.cache_key();
        let started = Instant::now();
        self.cache.set(&first_key, &first, self.entry_options().as_ref()).await?;
        report.record(BenchStep::Set, started.elapsed(), 1);

        let started = Instant::now();
        let value = self.cache.get(&first_key).await?;
        report.record(BenchStep::Get, started.elapsed(), 1);
        debug!(key = %first_key, hit = value.is_some(), "Read back first record");

        let items: Vec<(String, RealtimeOnline)> = records.iter().map(|r| (r.cache_key(), r.clone())).collect();
        let started = Instant::now();
        self.cache.set_many(&items, self.entry_options().as_ref(), false).await?;
        report.record(BenchStep::SetMany, started.elapsed(), items.len());

        let started = Instant::now();
        let values = self.cache.get_many(&keys).await?;
        report.record(BenchStep::GetMany, started.elapsed(), values.len());
        let hits = values.iter().filter(|(_, value)| value.is_some()).count();
        debug!(hits, misses = values.len() - hits, "Batch read");

        // Untimed: drop every other key so GetOrAddMany has misses to fill.
        let evicted: Vec<String> = keys.iter().step_by(2).cloned().collect();
        self.cache.remove_many(&evicted).await?;
        debug!(evicted = evicted.len(), "Evicted keys before GetOrAddMany");

        let by_key: HashMap<String, RealtimeOnline> = items.into_iter().rev().collect();
        let mut filled = 0;
        let started = Instant::now();
        let values = self
            .cache
            .get_or_add_many(
                &keys,
                |missing| {
                    let added: Vec<(String, RealtimeOnline)> = missing
                        .into_iter()
                        .filter_map(|key| by_key.get(&key).cloned().map(|record| (key, record)))
                        .collect();
                    filled = added.len();
                    future::ready(added)
                },
                self.entry_options().as_ref(),
            )
            .await?;
        report.record(BenchStep::GetOrAddMany, started.elapsed(), values.len());
        report.filled = filled;
        let hits = values.iter().filter(|(_, value)| value.is_some()).count();
        debug!(hits, filled, "Misses filled");

        let started = Instant::now();
        let removed = self.cache.remove_many(&keys).await?;
        report.record(BenchStep::FinalCleanup, started.elapsed(), keys.len());
        debug!(removed, "Benchmark entries removed");

        Ok(report)
    }
}
