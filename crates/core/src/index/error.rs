//! Error types for the index module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building, writing or reading an index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// The index file does not exist.
    #[error("Index file not found: {path}")]
    NotFound { path: PathBuf },

    /// A header or job line could not be parsed. Fatal for the run: a
    /// corrupt index must never be partially resumed.
    #[error("Malformed index at line {line}: {reason}")]
    Malformed { line: u64, reason: String },

    /// The source root to scan is not a readable directory.
    #[error("Cannot scan source root: {path}")]
    SourceRootUnreadable { path: PathBuf },

    /// I/O error while persisting or reading the index.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Creates a malformed-index error for the given 1-based line number.
    pub fn malformed(line: u64, reason: impl Into<String>) -> Self {
        Self::Malformed {
            line,
            reason: reason.into(),
        }
    }
}
