//! Error types for the converter module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// Output directory does not exist and could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// Conversion process failed or produced no output file.
    #[error("Conversion failed: {reason}")]
    ConversionFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// Conversion timed out.
    #[error("Conversion timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error during conversion.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConverterError {
    /// Creates a new conversion failed error with stderr output.
    pub fn conversion_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::ConversionFailed {
            reason: reason.into(),
            stderr,
        }
    }

    /// Renders the error for the operator, including the tool's own
    /// diagnostic output when there is any.
    pub fn diagnostic(&self) -> String {
        match self {
            Self::ConversionFailed {
                reason,
                stderr: Some(stderr),
            } if !stderr.is_empty() => format!("{}\n{}", reason, stderr.trim_end()),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_includes_stderr() {
        let err = ConverterError::conversion_failed(
            "exit code 1",
            Some("Unknown encoder 'xyz'\n".to_string()),
        );
        let diag = err.diagnostic();
        assert!(diag.contains("exit code 1"));
        assert!(diag.contains("Unknown encoder"));
    }

    #[test]
    fn test_diagnostic_without_stderr() {
        let err = ConverterError::Timeout { timeout_secs: 60 };
        assert!(err.diagnostic().contains("60 seconds"));
    }
}
