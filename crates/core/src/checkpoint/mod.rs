//! Checkpoint persistence: the resume cursor.
//!
//! The checkpoint is deliberately separate from the index so the job list
//! and the progress cursor can be reasoned about independently. A present
//! checkpoint is the sole signal that a prior run was interrupted and can be
//! resumed. The on-disk form is one line: `<files_done>,<conversions_done>`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Counts of jobs fully processed, and how many of those were conversions.
///
/// Both counts always describe a contiguous prefix of the index: `files_done`
/// advances one job at a time and never skips or double-counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub files_done: u64,
    pub conversions_done: u64,
}

/// Errors that can occur while persisting or loading a checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The checkpoint contents could not be parsed. Fatal: no partial
    /// resume is attempted from a corrupt cursor.
    #[error("Malformed checkpoint: {reason}")]
    Malformed { reason: String },

    /// I/O error reading or writing the checkpoint file.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// File-backed checkpoint store.
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    /// Creates a store persisting at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a checkpoint is currently persisted.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Durably writes the cursor (temp file + rename).
    pub fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        let mut tmp_name = self.path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp = self.path.with_file_name(tmp_name);

        fs::write(
            &tmp,
            format!("{},{}\n", checkpoint.files_done, checkpoint.conversions_done),
        )?;
        fs::rename(&tmp, &self.path)?;
        debug!(
            files_done = checkpoint.files_done,
            conversions_done = checkpoint.conversions_done,
            "checkpoint saved"
        );
        Ok(())
    }

    /// Reads the persisted cursor, or `None` when no checkpoint exists.
    pub fn load(&self) -> Result<Option<Checkpoint>, CheckpointError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CheckpointError::Io(e)),
        };

        let line = contents.trim();
        let mut parts = line.split(',');
        let files_done = parts
            .next()
            .map(str::trim)
            .and_then(|s| s.parse::<u64>().ok());
        let conversions_done = parts
            .next()
            .map(str::trim)
            .and_then(|s| s.parse::<u64>().ok());

        match (files_done, conversions_done, parts.next()) {
            (Some(files_done), Some(conversions_done), None) => Ok(Some(Checkpoint {
                files_done,
                conversions_done,
            })),
            _ => Err(CheckpointError::Malformed {
                reason: format!("invalid checkpoint contents {:?}", line),
            }),
        }
    }

    /// Removes the checkpoint. Missing file is not an error.
    pub fn clear(&self) -> Result<(), CheckpointError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CheckpointError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoint"));

        let checkpoint = Checkpoint {
            files_done: 42,
            conversions_done: 17,
        };
        store.save(checkpoint).unwrap();
        assert_eq!(store.load().unwrap(), Some(checkpoint));
    }

    #[test]
    fn test_load_absent_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoint"));
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.exists());
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoint"));

        store.save(Checkpoint::default()).unwrap();
        assert!(store.exists());
        store.clear().unwrap();
        assert!(!store.exists());
        // Clearing twice is fine.
        store.clear().unwrap();
    }

    #[test]
    fn test_save_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("checkpoint"));

        store
            .save(Checkpoint {
                files_done: 1,
                conversions_done: 0,
            })
            .unwrap();
        store
            .save(Checkpoint {
                files_done: 9,
                conversions_done: 4,
            })
            .unwrap();
        assert_eq!(
            store.load().unwrap(),
            Some(Checkpoint {
                files_done: 9,
                conversions_done: 4,
            })
        );
    }

    #[test]
    fn test_malformed_checkpoint_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint");
        fs::write(&path, "not,a,checkpoint\n").unwrap();

        let store = CheckpointStore::new(&path);
        assert!(matches!(
            store.load(),
            Err(CheckpointError::Malformed { .. })
        ));
    }

    #[test]
    fn test_on_disk_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("checkpoint");
        let store = CheckpointStore::new(&path);
        store
            .save(Checkpoint {
                files_done: 12,
                conversions_done: 7,
            })
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "12,7\n");
    }
}
