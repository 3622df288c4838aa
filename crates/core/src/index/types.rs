//! Types for the index module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What the scheduler should do with a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobAction {
    /// Run the external codec tool.
    Convert,
    /// Byte-for-byte duplicate into the output tree.
    Copy,
}

impl JobAction {
    /// The single-character flag used in the on-disk record.
    pub fn flag(&self) -> &'static str {
        match self {
            Self::Convert => "1",
            Self::Copy => "0",
        }
    }

    /// Parses the on-disk flag. Returns `None` for anything but `0`/`1`.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag {
            "1" => Some(Self::Convert),
            "0" => Some(Self::Copy),
            _ => None,
        }
    }
}

/// One unit of planned work: a fixed input/output path pair plus the action.
///
/// Both paths are absolute and immutable once recorded; the output path is
/// derived deterministically from the input, so it is unique per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    pub action: JobAction,
}

impl Job {
    /// Creates a Convert job.
    pub fn convert(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            action: JobAction::Convert,
        }
    }

    /// Creates a Copy job.
    pub fn copy(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            action: JobAction::Copy,
        }
    }
}

/// Index header totals, finalized after the scan completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexHeader {
    /// Count of all jobs in the index.
    pub total_jobs: u64,
    /// Count of jobs with action = Convert. Always `<= total_jobs`.
    pub convert_jobs: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_flag_round_trip() {
        assert_eq!(JobAction::from_flag(JobAction::Convert.flag()), Some(JobAction::Convert));
        assert_eq!(JobAction::from_flag(JobAction::Copy.flag()), Some(JobAction::Copy));
    }

    #[test]
    fn test_action_flag_rejects_garbage() {
        assert_eq!(JobAction::from_flag("2"), None);
        assert_eq!(JobAction::from_flag(""), None);
        assert_eq!(JobAction::from_flag("10"), None);
    }
}
