//! Benchmark fixture loading.

use cachebench_core::{CacheBenchError, CacheBenchResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Device mappings read from the fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    pub items: Vec<FixtureItem>,
}

/// A single enterprise/device/parameter mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct FixtureItem {
    pub enterprise_code: String,
    pub device_number: String,
    pub dict_number: String,
}

impl Fixture {
    /// Read and parse the fixture at `path`.
    pub async fn load(path: impl AsRef<Path>) -> CacheBenchResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Reading fixture");

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| CacheBenchError::fixture(path.display(), e))?;

        let fixture = Self::parse(&content).map_err(|e| match e {
            CacheBenchError::Fixture { message, .. } => CacheBenchError::fixture(path.display(), message),
            other => other,
        })?;

        info!(path = %path.display(), items = fixture.items.len(), "Fixture loaded");
        Ok(fixture)
    }

    /// Parse fixture JSON.
    pub fn parse(json: &str) -> CacheBenchResult<Self> {
        serde_json::from_str(json).map_err(|e| CacheBenchError::fixture("<inline>", e))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
