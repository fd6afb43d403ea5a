//! Configuration for the conversion engine.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Worker pool and timing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of jobs running at the same time.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// Upper bound for a single transcode, in seconds.
    #[serde(default = "default_job_timeout")]
    pub job_timeout_secs: u64,

    /// Largest wait a caller may request from `await_batch` over the API.
    #[serde(default = "default_await_timeout_cap")]
    pub await_timeout_cap_secs: u64,

    /// How long finished batches are kept for status queries.
    #[serde(default = "default_batch_retention")]
    pub batch_retention_secs: u64,
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_job_timeout() -> u64 {
    1800 // 30 minutes
}

fn default_await_timeout_cap() -> u64 {
    300
}

fn default_batch_retention() -> u64 {
    3600
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            job_timeout_secs: default_job_timeout(),
            await_timeout_cap_secs: default_await_timeout_cap(),
            batch_retention_secs: default_batch_retention(),
        }
    }
}

impl EngineConfig {
    /// Sets the worker pool size.
    pub fn with_max_concurrent_jobs(mut self, max_concurrent_jobs: usize) -> Self {
        self.max_concurrent_jobs = max_concurrent_jobs;
        self
    }

    /// Sets the per-job transcode timeout in seconds.
    pub fn with_job_timeout(mut self, job_timeout_secs: u64) -> Self {
        self.job_timeout_secs = job_timeout_secs;
        self
    }

    pub fn job_timeout(&self) -> Duration {
        Duration::from_secs(self.job_timeout_secs)
    }

    pub fn await_timeout_cap(&self) -> Duration {
        Duration::from_secs(self.await_timeout_cap_secs)
    }

    pub fn batch_retention(&self) -> Duration {
        Duration::from_secs(self.batch_retention_secs)
    }
}
