//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::converter::{
    ConversionJob, ConversionProgress, ConversionResult, Converter, ConverterError,
};

/// A recorded conversion job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// The job that was submitted.
    pub job: ConversionJob,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversion jobs for assertions
/// - Inject failures for chosen input paths
/// - Simulate conversion latency
/// - Observe the peak number of concurrent conversions
/// - Actually create output files, so resume and verification tests see
///   real filesystem state
#[derive(Debug)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// Input paths whose conversion should fail (and produce no output).
    fail_inputs: Arc<RwLock<HashSet<PathBuf>>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
    /// Whether successful conversions create their output file.
    write_outputs: Arc<RwLock<bool>>,
    /// Currently running conversions.
    active: Arc<AtomicUsize>,
    /// High-water mark of concurrent conversions.
    max_active: Arc<AtomicUsize>,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            fail_inputs: Arc::new(RwLock::new(HashSet::new())),
            conversion_duration_ms: Arc::new(RwLock::new(0)),
            write_outputs: Arc::new(RwLock::new(true)),
            active: Arc::new(AtomicUsize::new(0)),
            max_active: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions performed.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Clear recorded conversions.
    pub async fn clear_recorded(&self) {
        self.conversions.write().await.clear();
    }

    /// Make conversions of this input path fail without producing output.
    pub async fn fail_for_input(&self, path: impl AsRef<Path>) {
        self.fail_inputs
            .write()
            .await
            .insert(path.as_ref().to_path_buf());
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, duration: Duration) {
        *self.conversion_duration_ms.write().await = duration.as_millis() as u64;
    }

    /// Enable or disable creation of output files on success.
    pub async fn set_write_outputs(&self, write: bool) {
        *self.write_outputs.write().await = write;
    }

    /// Peak number of conversions that ran concurrently.
    pub fn max_concurrent_seen(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    /// Resets the concurrency high-water mark.
    pub fn reset_concurrency(&self) {
        self.max_active.store(0, Ordering::SeqCst);
    }

    async fn should_fail(&self, job: &ConversionJob) -> bool {
        self.fail_inputs.read().await.contains(&job.input_path)
    }

    async fn write_output(&self, job: &ConversionJob) -> Result<(), ConverterError> {
        if *self.write_outputs.read().await {
            if let Some(parent) = job.output_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&job.output_path, b"converted").await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError> {
        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(running, Ordering::SeqCst);

        let duration_ms = *self.conversion_duration_ms.read().await;
        if duration_ms > 0 {
            tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        }

        let result = if self.should_fail(&job).await {
            Err(ConverterError::conversion_failed(
                "injected failure",
                Some(format!("mock: refusing to convert {}", job.input_path.display())),
            ))
        } else {
            self.write_output(&job).await.map(|_| ConversionResult {
                job_id: job.job_id.clone(),
                output_path: job.output_path.clone(),
                output_size_bytes: 9,
                duration_ms,
            })
        };

        self.conversions.write().await.push(RecordedConversion {
            job,
            success: result.is_ok(),
        });
        self.active.fetch_sub(1, Ordering::SeqCst);
        result
    }

    async fn convert_with_progress(
        &self,
        job: ConversionJob,
        progress_tx: mpsc::Sender<ConversionProgress>,
    ) -> Result<ConversionResult, ConverterError> {
        let _ = progress_tx
            .send(ConversionProgress {
                job_id: job.job_id.clone(),
                out_time_secs: 0.0,
                speed: Some("10x".to_string()),
            })
            .await;
        self.convert(job).await
    }

    async fn validate(&self) -> Result<(), ConverterError> {
        Ok(())
    }
}
