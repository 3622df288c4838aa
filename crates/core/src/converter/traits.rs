//! Trait definitions for the converter module.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::error::ConverterError;
use super::types::{ConversionJob, ConversionProgress, ConversionResult};

/// An external worker that converts one media file at a time.
///
/// The contract is deliberately opaque: given an input path and an output
/// path, either the output exists afterwards and `Ok` is returned, or the
/// attempt failed and the error carries whatever diagnostic text the tool
/// produced. Implementations must be safe to call concurrently.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Converts a media file according to the job specification.
    async fn convert(&self, job: ConversionJob) -> Result<ConversionResult, ConverterError>;

    /// Converts a media file with progress reporting.
    ///
    /// If the receiver is dropped, conversion continues without progress
    /// reporting.
    async fn convert_with_progress(
        &self,
        job: ConversionJob,
        progress_tx: mpsc::Sender<ConversionProgress>,
    ) -> Result<ConversionResult, ConverterError>;

    /// Validates that the converter is properly configured and ready.
    async fn validate(&self) -> Result<(), ConverterError>;
}
