//! Types for the scheduler module.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

use crate::checkpoint::Checkpoint;
use crate::index::JobAction;

/// Where the scheduler currently is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Skipping the already-completed prefix of the index.
    Replaying,
    /// Submitting jobs in index order.
    Dispatching,
    /// All jobs submitted, waiting for in-flight work.
    Draining,
    Completed,
    Interrupted,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Replaying => "replaying",
            Self::Dispatching => "dispatching",
            Self::Draining => "draining",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
        };
        f.write_str(name)
    }
}

/// A job that was executed but did not produce its output.
///
/// Failures are non-fatal: the cursor still advances so resumption does not
/// retry them, and the verifier surfaces the missing output afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct JobFailure {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub action: JobAction,
    /// The tool's diagnostic text, or the I/O error for copy jobs.
    pub diagnostic: String,
}

/// Progress snapshot sent after every completed job.
#[derive(Debug, Clone)]
pub struct RunProgress {
    pub files_done: u64,
    pub total_jobs: u64,
    pub conversions_done: u64,
    pub convert_jobs: u64,
    /// Input path of the most recently completed job.
    pub current_path: Option<PathBuf>,
}

/// Final accounting of one scheduler run.
#[derive(Debug)]
pub struct ScheduleOutcome {
    /// Confirmed-prefix cursor, suitable for persisting as a checkpoint.
    pub files_done: u64,
    pub conversions_done: u64,
    /// Jobs that ran but failed (cursor advanced past them anyway).
    pub failures: Vec<JobFailure>,
    /// True when the run was cancelled before completing.
    pub interrupted: bool,
}

impl ScheduleOutcome {
    /// The resume cursor this outcome stands for.
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            files_done: self.files_done,
            conversions_done: self.conversions_done,
        }
    }
}
