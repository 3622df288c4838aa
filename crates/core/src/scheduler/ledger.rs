//! Completion accounting keyed by job identity.
//!
//! Convert jobs finish in arbitrary order, but the persisted cursor is an
//! offset into the strictly ordered index. Tracking a bare count could
//! checkpoint past a job whose output never landed while a later job
//! finished early. The ledger therefore records completions by index
//! position and only advances the cursor over a fully-confirmed contiguous
//! prefix; completions beyond a gap wait until the gap closes.

use std::collections::BTreeMap;

use crate::checkpoint::Checkpoint;
use crate::index::JobAction;

use super::types::{JobFailure, ScheduleOutcome};

pub(super) struct CompletionLedger {
    files_done: u64,
    conversions_done: u64,
    /// Completed positions beyond the confirmed prefix.
    completed: BTreeMap<u64, JobAction>,
    failures: Vec<JobFailure>,
}

impl CompletionLedger {
    pub fn new(resume: Checkpoint) -> Self {
        Self {
            files_done: resume.files_done,
            conversions_done: resume.conversions_done,
            completed: BTreeMap::new(),
            failures: Vec::new(),
        }
    }

    /// Records one finished job. A failed job still advances the cursor so
    /// resumption does not retry it; the failure is kept for the summary.
    pub fn record(&mut self, position: u64, action: JobAction, failure: Option<JobFailure>) {
        if let Some(failure) = failure {
            self.failures.push(failure);
        }
        self.completed.insert(position, action);
        while let Some(action) = self.completed.remove(&self.files_done) {
            self.files_done += 1;
            if action == JobAction::Convert {
                self.conversions_done += 1;
            }
        }
    }

    /// Confirmed-prefix job count.
    pub fn files_done(&self) -> u64 {
        self.files_done
    }

    /// Conversions within the confirmed prefix.
    pub fn conversions_done(&self) -> u64 {
        self.conversions_done
    }

    /// Completions stranded beyond a gap in the prefix.
    pub fn stranded(&self) -> usize {
        self.completed.len()
    }

    pub fn into_outcome(self, interrupted: bool) -> ScheduleOutcome {
        ScheduleOutcome {
            files_done: self.files_done,
            conversions_done: self.conversions_done,
            failures: self.failures,
            interrupted,
        }
    }
}
