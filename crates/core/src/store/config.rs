//! Configuration for the result store.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retention settings for converted artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// How long an artifact stays retrievable after it is stored.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    /// How often the background sweeper evicts expired artifacts.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// How long an evicted artifact is remembered so lookups report
    /// `Expired` rather than `NotFound`.
    #[serde(default = "default_tombstone_retention")]
    pub tombstone_retention_secs: u64,
}

fn default_ttl() -> u64 {
    1800 // 30 minutes
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_tombstone_retention() -> u64 {
    86400 // 24 hours
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            sweep_interval_secs: default_sweep_interval(),
            tombstone_retention_secs: default_tombstone_retention(),
        }
    }
}

impl StoreConfig {
    /// Sets the artifact TTL in seconds.
    pub fn with_ttl(mut self, ttl_secs: u64) -> Self {
        self.ttl_secs = ttl_secs;
        self
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }

    pub fn tombstone_retention(&self) -> Duration {
        Duration::from_secs(self.tombstone_retention_secs)
    }
}
