//! The scheduler: replay, dispatch, drain.
//!
//! One coordinating task owns the cursor and the counters; workers execute
//! conversions and report back over a completion channel, never mutating
//! shared state. Copy jobs are cheap I/O and run inline on the coordinator.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::checkpoint::Checkpoint;
use crate::converter::{ConversionJob, Converter};
use crate::index::{IndexError, IndexHeader, IndexReader, Job, JobAction};

use super::cancel::CancelToken;
use super::config::SchedulerConfig;
use super::error::SchedulerError;
use super::ledger::CompletionLedger;
use super::types::{JobFailure, Phase, RunProgress, ScheduleOutcome};

/// Message a worker sends when its job finishes, success or failure.
struct Completion {
    position: u64,
    action: JobAction,
    input_path: std::path::PathBuf,
    failure: Option<JobFailure>,
}

/// Replays an index against a bounded pool of conversion workers.
pub struct Scheduler<C> {
    config: SchedulerConfig,
    converter: Arc<C>,
}

impl<C: Converter + 'static> Scheduler<C> {
    pub fn new(config: SchedulerConfig, converter: Arc<C>) -> Self {
        Self { config, converter }
    }

    /// Runs every job in the index from the resume cursor onward.
    ///
    /// Jobs are submitted in index order; conversion completion order is
    /// unordered, but the returned counters always describe a confirmed
    /// contiguous prefix of the index (see [`CompletionLedger`]).
    pub async fn run(
        &self,
        reader: &mut IndexReader,
        resume: Checkpoint,
        mut cancel: CancelToken,
        progress_tx: Option<mpsc::Sender<RunProgress>>,
    ) -> Result<ScheduleOutcome, SchedulerError> {
        let header = reader.header();
        if resume.files_done > header.total_jobs {
            return Err(SchedulerError::CursorBeyondIndex {
                cursor: resume.files_done,
                total_jobs: header.total_jobs,
            });
        }
        if resume.conversions_done > header.convert_jobs {
            return Err(SchedulerError::CursorBeyondIndex {
                cursor: resume.conversions_done,
                total_jobs: header.convert_jobs,
            });
        }

        let mut phase = Phase::Replaying;
        if resume.files_done > 0 {
            info!(phase = %phase, jobs = resume.files_done, "skipping already-completed prefix");
        }
        for _ in 0..resume.files_done {
            match reader.next_job()? {
                Some(job) => debug!(output = %job.output_path.display(), "already done"),
                None => {
                    return Err(SchedulerError::CursorBeyondIndex {
                        cursor: resume.files_done,
                        total_jobs: reader.jobs_read(),
                    })
                }
            }
        }

        let mut ledger = CompletionLedger::new(resume);
        let semaphore = Arc::new(Semaphore::new(self.config.max_workers.max(1)));
        let (done_tx, mut done_rx) =
            mpsc::channel::<Completion>(self.config.max_workers.max(1) * 2);
        let mut in_flight: usize = 0;
        let mut position = resume.files_done;
        let mut interrupted = false;

        phase = Phase::Dispatching;
        debug!(phase = %phase, total_jobs = header.total_jobs, "dispatching jobs");

        loop {
            // Fold completions that arrived since the last dispatch.
            while let Ok(done) = done_rx.try_recv() {
                in_flight -= 1;
                fold_completion(&mut ledger, header, done, &progress_tx);
            }

            if cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            let Some(job) = reader.next_job()? else { break };

            match job.action {
                JobAction::Copy => {
                    let input_path = job.input_path.clone();
                    let failure = copy_file(&job).await.err();
                    fold_completion(
                        &mut ledger,
                        header,
                        Completion {
                            position,
                            action: JobAction::Copy,
                            input_path,
                            failure,
                        },
                        &progress_tx,
                    );
                }
                JobAction::Convert if self.config.max_workers == 0 => {
                    // Degraded single-worker mode: convert on the coordinator.
                    let input_path = job.input_path.clone();
                    let failure = run_conversion(self.converter.as_ref(), &job, position).await;
                    fold_completion(
                        &mut ledger,
                        header,
                        Completion {
                            position,
                            action: JobAction::Convert,
                            input_path,
                            failure,
                        },
                        &progress_tx,
                    );
                }
                JobAction::Convert => {
                    // Backpressure: block until a pool slot frees, unless
                    // cancellation arrives first.
                    let permit = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            interrupted = true;
                            break;
                        }
                        permit = Arc::clone(&semaphore).acquire_owned() => {
                            permit.map_err(|_| SchedulerError::PoolClosed)?
                        }
                    };
                    in_flight += 1;
                    self.spawn_worker(job, position, permit, done_tx.clone());
                }
            }
            position += 1;
        }

        if !interrupted && reader.jobs_read() != header.total_jobs {
            return Err(IndexError::malformed(
                1,
                format!(
                    "header claims {} jobs, index holds {}",
                    header.total_jobs,
                    reader.jobs_read()
                ),
            )
            .into());
        }

        phase = Phase::Draining;
        debug!(phase = %phase, in_flight, "waiting for in-flight conversions");
        drop(done_tx);

        if interrupted {
            let deadline = Duration::from_secs(self.config.drain_timeout_secs);
            if timeout(
                deadline,
                drain_remaining(&mut done_rx, &mut in_flight, &mut ledger, header, &progress_tx),
            )
            .await
            .is_err()
            {
                // Abandoned jobs are not counted; resume re-runs them.
                warn!(abandoned = in_flight, "drain timeout reached, abandoning unfinished conversions");
            }
        } else {
            drain_remaining(&mut done_rx, &mut in_flight, &mut ledger, header, &progress_tx).await;
            if in_flight > 0 {
                warn!(lost = in_flight, "worker pool closed with unreported jobs");
            }
        }

        if ledger.stranded() > 0 {
            debug!(
                stranded = ledger.stranded(),
                "completions beyond the confirmed prefix are discarded"
            );
        }

        phase = if interrupted {
            Phase::Interrupted
        } else {
            Phase::Completed
        };
        let outcome = ledger.into_outcome(interrupted);
        info!(
            phase = %phase,
            files_done = outcome.files_done,
            conversions_done = outcome.conversions_done,
            failures = outcome.failures.len(),
            "scheduler finished"
        );
        Ok(outcome)
    }

    fn spawn_worker(
        &self,
        job: Job,
        position: u64,
        permit: OwnedSemaphorePermit,
        done_tx: mpsc::Sender<Completion>,
    ) {
        let converter = Arc::clone(&self.converter);
        tokio::spawn(async move {
            let _permit = permit;
            let failure = run_conversion(converter.as_ref(), &job, position).await;
            let completion = Completion {
                position,
                action: JobAction::Convert,
                input_path: job.input_path,
                failure,
            };
            if done_tx.send(completion).await.is_err() {
                debug!("scheduler stopped before completion was recorded");
            }
        });
    }
}

async fn drain_remaining(
    done_rx: &mut mpsc::Receiver<Completion>,
    in_flight: &mut usize,
    ledger: &mut CompletionLedger,
    header: IndexHeader,
    progress_tx: &Option<mpsc::Sender<RunProgress>>,
) {
    while *in_flight > 0 {
        match done_rx.recv().await {
            Some(done) => {
                *in_flight -= 1;
                fold_completion(ledger, header, done, progress_tx);
            }
            None => break,
        }
    }
}

fn fold_completion(
    ledger: &mut CompletionLedger,
    header: IndexHeader,
    done: Completion,
    progress_tx: &Option<mpsc::Sender<RunProgress>>,
) {
    ledger.record(done.position, done.action, done.failure);
    if let Some(tx) = progress_tx {
        // Non-blocking: a slow consumer must not stall the coordinator.
        let _ = tx.try_send(RunProgress {
            files_done: ledger.files_done(),
            total_jobs: header.total_jobs,
            conversions_done: ledger.conversions_done(),
            convert_jobs: header.convert_jobs,
            current_path: Some(done.input_path),
        });
    }
}

async fn run_conversion<C: Converter>(
    converter: &C,
    job: &Job,
    position: u64,
) -> Option<JobFailure> {
    let conversion = ConversionJob {
        job_id: format!("job-{}", position),
        input_path: job.input_path.clone(),
        output_path: job.output_path.clone(),
    };
    match converter.convert(conversion).await {
        Ok(result) => {
            debug!(
                input = %job.input_path.display(),
                duration_ms = result.duration_ms,
                "conversion finished"
            );
            None
        }
        Err(e) => {
            warn!(input = %job.input_path.display(), "conversion failed: {}", e);
            Some(JobFailure {
                input_path: job.input_path.clone(),
                output_path: job.output_path.clone(),
                action: JobAction::Convert,
                diagnostic: e.diagnostic(),
            })
        }
    }
}

async fn copy_file(job: &Job) -> Result<(), JobFailure> {
    let result = async {
        if let Some(parent) = job.output_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(&job.input_path, &job.output_path).await?;
        Ok::<_, std::io::Error>(())
    }
    .await;

    result.map_err(|e| {
        warn!(input = %job.input_path.display(), "copy failed: {}", e);
        JobFailure {
            input_path: job.input_path.clone(),
            output_path: job.output_path.clone(),
            action: JobAction::Copy,
            diagnostic: e.to_string(),
        }
    })
}
