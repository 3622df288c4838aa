use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::converter::ConverterConfig;
use crate::index::DEFAULT_FLUSH_EVERY;
use crate::scheduler::SchedulerConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub converter: ConverterConfig,
}

/// Durable-state file locations and index writer tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndexConfig {
    /// Where the job index is persisted between invocations.
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Where the resume cursor is persisted on interruption.
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    /// Records buffered in memory before a flush while scanning.
    #[serde(default = "default_flush_every")]
    pub flush_every: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            checkpoint_path: default_checkpoint_path(),
            flush_every: default_flush_every(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from(".rekonvert-index")
}

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from(".rekonvert-checkpoint")
}

fn default_flush_every() -> usize {
    DEFAULT_FLUSH_EVERY
}
