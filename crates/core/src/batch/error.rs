//! Error types for the batch module.

use thiserror::Error;

use crate::checkpoint::CheckpointError;
use crate::converter::ConverterError;
use crate::index::IndexError;
use crate::scheduler::SchedulerError;

/// Errors that abort a batch run.
#[derive(Debug, Error)]
pub enum BatchError {
    /// Index construction or reading failed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The scheduler hit a structural failure.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// The checkpoint could not be persisted or loaded. Fatal: the run
    /// cannot continue safely without durable state.
    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    /// The converter is unusable or a single-file conversion failed.
    #[error(transparent)]
    Converter(#[from] ConverterError),

    /// Resume was requested but there is no index/checkpoint pair.
    #[error("No interrupted run to resume")]
    NothingToResume,

    /// A background task (scan or verify) panicked.
    #[error("Background task failed: {0}")]
    TaskFailed(String),

    /// I/O error while cleaning up run state.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
