//! Configuration for the scheduler module.

use serde::{Deserialize, Serialize};

/// Configuration for the replay/dispatch/drain loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Maximum concurrent conversion workers. `0` runs conversions inline on
    /// the coordinator, a degraded mode for environments where spawning
    /// parallel external processes is not safe.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// How long an interrupted run waits for in-flight conversions before
    /// abandoning them (abandoned jobs are not counted and re-run on resume).
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_secs: u64,
}

fn default_max_workers() -> usize {
    16
}

fn default_drain_timeout() -> u64 {
    30
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            drain_timeout_secs: default_drain_timeout(),
        }
    }
}

impl SchedulerConfig {
    /// Sets the worker pool size.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Sets the interrupted-drain timeout.
    pub fn with_drain_timeout(mut self, drain_timeout_secs: u64) -> Self {
        self.drain_timeout_secs = drain_timeout_secs;
        self
    }
}
