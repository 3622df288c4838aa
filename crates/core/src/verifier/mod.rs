//! Post-run verification.
//!
//! The verifier is the ground-truth check: it re-reads the index and reports
//! every job whose expected output does not exist on disk, independent of
//! what the scheduler's bookkeeping claims. Purely diagnostic; it never
//! fails a run.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::index::{IndexError, IndexReader};

/// A job whose expected output was not found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingOutput {
    pub input_path: PathBuf,
    pub output_path: PathBuf,
}

/// Re-reads the index at `index_path` and returns every job whose output
/// path is missing.
pub fn verify(index_path: &Path) -> Result<Vec<MissingOutput>, IndexError> {
    let mut reader = IndexReader::open(index_path)?;
    let mut missing = Vec::new();

    while let Some(job) = reader.next_job()? {
        if !job.output_path.exists() {
            debug!(output = %job.output_path.display(), "expected output missing");
            missing.push(MissingOutput {
                input_path: job.input_path,
                output_path: job.output_path,
            });
        }
    }

    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{IndexWriter, Job, DEFAULT_FLUSH_EVERY};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_all_outputs_present() {
        let dir = TempDir::new().unwrap();
        let out_a = dir.path().join("a.flac");
        let out_b = dir.path().join("b.txt");
        fs::write(&out_a, b"a").unwrap();
        fs::write(&out_b, b"b").unwrap();

        let index_path = dir.path().join("index");
        let mut writer = IndexWriter::create(&index_path, DEFAULT_FLUSH_EVERY).unwrap();
        writer.append(&Job::convert("/in/a.mp3", &out_a)).unwrap();
        writer.append(&Job::copy("/in/b.txt", &out_b)).unwrap();
        writer.finish().unwrap();

        assert!(verify(&index_path).unwrap().is_empty());
    }

    #[test]
    fn test_missing_outputs_reported() {
        let dir = TempDir::new().unwrap();
        let out_a = dir.path().join("a.flac");
        let out_b = dir.path().join("b.txt");
        fs::write(&out_b, b"b").unwrap();

        let index_path = dir.path().join("index");
        let mut writer = IndexWriter::create(&index_path, DEFAULT_FLUSH_EVERY).unwrap();
        writer.append(&Job::convert("/in/a.mp3", &out_a)).unwrap();
        writer.append(&Job::copy("/in/b.txt", &out_b)).unwrap();
        writer.finish().unwrap();

        let missing = verify(&index_path).unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].output_path, out_a);
        assert_eq!(missing[0].input_path, PathBuf::from("/in/a.mp3"));
    }

    #[test]
    fn test_missing_index_is_error() {
        let result = verify(Path::new("/nonexistent/index"));
        assert!(matches!(result, Err(IndexError::NotFound { .. })));
    }
}
