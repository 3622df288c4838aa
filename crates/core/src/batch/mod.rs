//! Batch module: whole-run coordination.
//!
//! Control flow: the index builder produces an index, the scheduler
//! replays it (optionally resuming from a checkpoint), and on normal
//! completion the verifier checks every expected output before index and
//! checkpoint are deleted. On interruption the cursor is persisted and the
//! index preserved for the next invocation.

mod error;
mod runner;
mod types;

pub use error::BatchError;
pub use runner::BatchRunner;
pub use types::{RunOptions, RunReport};
