//! The batch coordinator.
//!
//! Drives one run end to end: build the index (or reopen it when resuming),
//! replay it through the scheduler, then either persist the checkpoint
//! (interrupted) or verify the outputs and delete both durable files
//! (completed).

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::spawn_blocking;
use tracing::{info, warn};

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::config::Config;
use crate::converter::{ConversionJob, ConversionResult, Converter};
use crate::index::{IndexBuilder, IndexReader, ScanOptions};
use crate::scheduler::{CancelToken, RunProgress, Scheduler};
use crate::verifier::{self, MissingOutput};

use super::error::BatchError;
use super::types::{RunOptions, RunReport};

/// Coordinates index, scheduler, checkpoint and verifier for whole runs.
pub struct BatchRunner<C> {
    config: Config,
    converter: Arc<C>,
    checkpoint_store: CheckpointStore,
}

impl<C: Converter + 'static> BatchRunner<C> {
    pub fn new(config: Config, converter: Arc<C>) -> Self {
        let checkpoint_store = CheckpointStore::new(&config.index.checkpoint_path);
        Self {
            config,
            converter,
            checkpoint_store,
        }
    }

    /// Whether a prior run left both an index and a checkpoint behind.
    pub fn has_resumable_run(&self) -> bool {
        self.config.index.index_path.exists() && self.checkpoint_store.exists()
    }

    /// The checkpoint of the interrupted run, if one exists.
    pub fn resumable_checkpoint(&self) -> Result<Option<Checkpoint>, BatchError> {
        if !self.config.index.index_path.exists() {
            return Ok(None);
        }
        Ok(self.checkpoint_store.load()?)
    }

    /// Executes one batch run.
    ///
    /// With `resume` set, the existing index is replayed from the persisted
    /// cursor; otherwise any stale index/checkpoint pair is discarded and a
    /// fresh scan is performed.
    pub async fn run(
        &self,
        options: RunOptions,
        resume: bool,
        cancel: CancelToken,
        progress_tx: Option<mpsc::Sender<RunProgress>>,
    ) -> Result<RunReport, BatchError> {
        let started_at = Utc::now();
        self.converter.validate().await?;

        let index_path = self.config.index.index_path.clone();
        let start = if resume {
            let checkpoint = self
                .checkpoint_store
                .load()?
                .ok_or(BatchError::NothingToResume)?;
            if !index_path.exists() {
                return Err(BatchError::NothingToResume);
            }
            info!(
                files_done = checkpoint.files_done,
                conversions_done = checkpoint.conversions_done,
                "resuming interrupted run"
            );
            checkpoint
        } else {
            // A stale pair from an abandoned run is superseded by a fresh scan.
            self.checkpoint_store.clear()?;
            if index_path.exists() {
                warn!(index = %index_path.display(), "discarding stale index from a prior run");
                tokio::fs::remove_file(&index_path).await?;
            }

            let builder = IndexBuilder::new(
                ScanOptions::new(&options.source_root, &options.output_root, options.output_format)
                    .recursive(options.recursive)
                    .skip_existing(options.skip_existing)
                    .copy_all(options.copy_all),
            )
            .with_flush_every(self.config.index.flush_every);
            let scan_path = index_path.clone();
            let header = spawn_blocking(move || builder.build(&scan_path))
                .await
                .map_err(|e| BatchError::TaskFailed(e.to_string()))??;
            info!(
                total_jobs = header.total_jobs,
                convert_jobs = header.convert_jobs,
                "index built"
            );
            Checkpoint::default()
        };

        let mut reader = IndexReader::open(&index_path)?;
        let header = reader.header();
        let scheduler = Scheduler::new(self.config.scheduler.clone(), Arc::clone(&self.converter));
        let outcome = scheduler.run(&mut reader, start, cancel, progress_tx).await?;

        let missing_outputs = if outcome.interrupted {
            self.checkpoint_store.save(outcome.checkpoint())?;
            info!(
                files_done = outcome.files_done,
                "run interrupted, checkpoint saved"
            );
            Vec::new()
        } else {
            let missing = self.verify_outputs(&index_path).await?;
            // Clean completion: both durable files are superseded.
            tokio::fs::remove_file(&index_path).await?;
            self.checkpoint_store.clear()?;
            missing
        };

        Ok(RunReport {
            started_at,
            finished_at: Utc::now(),
            total_jobs: header.total_jobs,
            convert_jobs: header.convert_jobs,
            files_done: outcome.files_done,
            conversions_done: outcome.conversions_done,
            failures: outcome.failures,
            missing_outputs,
            interrupted: outcome.interrupted,
            resumed: resume,
        })
    }

    async fn verify_outputs(&self, index_path: &Path) -> Result<Vec<MissingOutput>, BatchError> {
        let path = index_path.to_path_buf();
        let missing = spawn_blocking(move || verifier::verify(&path))
            .await
            .map_err(|e| BatchError::TaskFailed(e.to_string()))??;
        if !missing.is_empty() {
            warn!(count = missing.len(), "verification found missing outputs");
        }
        Ok(missing)
    }

    /// Converts exactly one file, bypassing index and checkpoint entirely.
    pub async fn convert_single(
        &self,
        input_path: &Path,
        output_path: &Path,
    ) -> Result<ConversionResult, BatchError> {
        self.converter.validate().await?;
        let job = ConversionJob {
            job_id: "single".to_string(),
            input_path: input_path.to_path_buf(),
            output_path: output_path.to_path_buf(),
        };
        Ok(self.converter.convert(job).await?)
    }
}
