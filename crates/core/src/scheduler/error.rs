//! Error types for the scheduler module.

use thiserror::Error;

use crate::index::IndexError;

/// Errors that abort a scheduler run.
///
/// Per-job failures are not errors; they are folded into the outcome's
/// failure list while the cursor keeps advancing.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The index could not be read or is corrupt.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The checkpoint claims more completed jobs than the index holds.
    #[error("Checkpoint cursor {cursor} is beyond the index ({total_jobs} jobs)")]
    CursorBeyondIndex { cursor: u64, total_jobs: u64 },

    /// The worker pool was torn down while jobs were still being submitted.
    #[error("Worker pool closed unexpectedly")]
    PoolClosed,
}
