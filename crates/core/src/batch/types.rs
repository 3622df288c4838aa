//! Types for the batch module.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

use crate::converter::OutputFormat;
use crate::scheduler::JobFailure;
use crate::verifier::MissingOutput;

/// What one batch run should do.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Root of the source tree.
    pub source_root: PathBuf,
    /// Root of the mirrored output tree.
    pub output_root: PathBuf,
    /// Target format for convertible files.
    pub output_format: OutputFormat,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Omit files whose destination already exists.
    pub skip_existing: bool,
    /// Copy non-convertible files instead of ignoring them.
    pub copy_all: bool,
}

impl RunOptions {
    /// Creates options with all flags off.
    pub fn new(
        source_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        output_format: OutputFormat,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            output_format,
            recursive: false,
            skip_existing: false,
            copy_all: false,
        }
    }

    /// Enables recursive traversal.
    pub fn recursive(mut self, enabled: bool) -> Self {
        self.recursive = enabled;
        self
    }

    /// Enables skipping of existing destinations.
    pub fn skip_existing(mut self, enabled: bool) -> Self {
        self.skip_existing = enabled;
        self
    }

    /// Enables copying of non-convertible files.
    pub fn copy_all(mut self, enabled: bool) -> Self {
        self.copy_all = enabled;
        self
    }
}

/// Summary of one batch run, printed (or serialized) for the operator.
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Totals from the index header.
    pub total_jobs: u64,
    pub convert_jobs: u64,
    /// Confirmed-prefix counters at the end of the run.
    pub files_done: u64,
    pub conversions_done: u64,
    /// Jobs that executed but failed; their outputs will also show up in
    /// `missing_outputs` unless something else created them.
    pub failures: Vec<JobFailure>,
    /// Verifier findings. Empty for interrupted runs (no verification pass).
    pub missing_outputs: Vec<MissingOutput>,
    pub interrupted: bool,
    pub resumed: bool,
}

impl RunReport {
    /// Whether every job completed and every output landed.
    pub fn is_clean(&self) -> bool {
        !self.interrupted && self.failures.is_empty() && self.missing_outputs.is_empty()
    }
}
