//! Redis topology configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Topology of the Redis deployment the cache talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RedisMode {
    /// A single Redis node.
    #[default]
    Single,
    /// A Redis cluster.
    Cluster,
}

impl RedisMode {
    /// Returns true if this is a cluster deployment.
    #[must_use]
    pub const fn is_cluster(&self) -> bool {
        matches!(self, Self::Cluster)
    }
}

impl fmt::Display for RedisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single => write!(f, "single"),
            Self::Cluster => write!(f, "cluster"),
        }
    }
}
