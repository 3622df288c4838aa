//! Scheduler module: bounded-concurrency replay of an index.
//!
//! The coordinator reads jobs in index order, executes Copy jobs inline,
//! dispatches Convert jobs to a bounded worker pool, and folds completion
//! messages into a cursor that always describes a confirmed prefix of the
//! index. Interruption is cooperative via [`CancelToken`]; an interrupted
//! run's cursor is safe to persist as a checkpoint.

mod cancel;
mod config;
mod error;
mod ledger;
mod runner;
mod types;

pub use cancel::{CancelSource, CancelToken};
pub use config::SchedulerConfig;
pub use error::SchedulerError;
pub use runner::Scheduler;
pub use types::{JobFailure, Phase, RunProgress, ScheduleOutcome};
