//! Index construction: directory scan and job classification.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::converter::{is_convertible_input, OutputFormat};
use crate::planner;

use super::error::IndexError;
use super::file::{IndexWriter, DEFAULT_FLUSH_EVERY};
use super::types::{IndexHeader, Job};

/// What to scan and how to classify it.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Root of the source tree.
    pub source_root: PathBuf,
    /// Root of the mirrored output tree.
    pub output_root: PathBuf,
    /// Target format for Convert jobs.
    pub output_format: OutputFormat,
    /// Descend into subdirectories.
    pub recursive: bool,
    /// Omit jobs whose destination already exists.
    pub skip_existing: bool,
    /// Record Copy jobs for non-convertible files instead of ignoring them.
    pub copy_all: bool,
}

impl ScanOptions {
    /// Creates options with all flags off.
    pub fn new(
        source_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        output_format: OutputFormat,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            output_format,
            recursive: false,
            skip_existing: false,
            copy_all: false,
        }
    }

    /// Enables recursive traversal.
    pub fn recursive(mut self, enabled: bool) -> Self {
        self.recursive = enabled;
        self
    }

    /// Enables skipping of jobs whose destination already exists.
    pub fn skip_existing(mut self, enabled: bool) -> Self {
        self.skip_existing = enabled;
        self
    }

    /// Enables copying of non-convertible files.
    pub fn copy_all(mut self, enabled: bool) -> Self {
        self.copy_all = enabled;
        self
    }
}

/// Walks the source tree breadth-first and streams the resulting job list
/// into an index file.
pub struct IndexBuilder {
    options: ScanOptions,
    flush_every: usize,
}

impl IndexBuilder {
    /// Creates a builder for the given scan options.
    pub fn new(options: ScanOptions) -> Self {
        Self {
            options,
            flush_every: DEFAULT_FLUSH_EVERY,
        }
    }

    /// Overrides the writer's flush batch size.
    pub fn with_flush_every(mut self, flush_every: usize) -> Self {
        self.flush_every = flush_every;
        self
    }

    /// Scans the source tree and installs the index at `index_path`.
    ///
    /// Directories are visited in FIFO order: every file of the current
    /// directory is classified before any subdirectory is entered.
    /// Unreadable entries are logged and skipped; only a failure to persist
    /// the index itself aborts the build, leaving no partial index behind.
    pub fn build(&self, index_path: &Path) -> Result<IndexHeader, IndexError> {
        let source_root = std::path::absolute(&self.options.source_root)?;
        let output_root = std::path::absolute(&self.options.output_root)?;
        if !source_root.is_dir() {
            return Err(IndexError::SourceRootUnreadable { path: source_root });
        }

        let mut writer = IndexWriter::create(index_path, self.flush_every)?;
        let mut queue = VecDeque::new();
        queue.push_back(source_root.clone());

        while let Some(dir) = queue.pop_front() {
            let entries = match fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(dir = %dir.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };

            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        warn!(dir = %dir.display(), error = %e, "skipping unreadable entry");
                        continue;
                    }
                };
                let file_type = match entry.file_type() {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        warn!(path = %entry.path().display(), error = %e, "skipping entry");
                        continue;
                    }
                };
                let path = entry.path();

                if file_type.is_dir() {
                    if self.options.recursive {
                        queue.push_back(path);
                    }
                    continue;
                }
                if !file_type.is_file() {
                    debug!(path = %path.display(), "skipping non-regular file");
                    continue;
                }

                if let Some(job) = self.classify(&path, &source_root, &output_root) {
                    writer.append(&job)?;
                }
            }
        }

        writer.finish()
    }

    /// Classifies one file, or returns `None` when it should be omitted.
    fn classify(&self, path: &Path, source_root: &Path, output_root: &Path) -> Option<Job> {
        let extension = file_extension(path);
        let convertible = extension
            .as_deref()
            .map(is_convertible_input)
            .unwrap_or(false);

        let job = if convertible {
            let output = planner::convert_output(
                path,
                source_root,
                output_root,
                self.options.output_format.extension(),
            );
            Job::convert(path, output)
        } else if self.options.copy_all {
            let output = planner::copy_output(path, source_root, output_root);
            Job::copy(path, output)
        } else {
            return None;
        };

        if self.options.skip_existing && job.output_path.exists() {
            debug!(output = %job.output_path.display(), "destination exists, skipping");
            return None;
        }
        Some(job)
    }
}

/// The lowercased extension, or `None` when there is none worth matching.
fn file_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty())
        .map(|e| e.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::file::IndexReader;
    use crate::index::types::JobAction;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        source: PathBuf,
        output: PathBuf,
        index_path: PathBuf,
    }

    /// Builds the tree from the classic scenario: `a.mp3`, `b.txt`,
    /// `sub/c.wav`.
    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("music");
        let output = dir.path().join("converted");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::create_dir_all(&output).unwrap();
        fs::write(source.join("a.mp3"), b"mp3").unwrap();
        fs::write(source.join("b.txt"), b"txt").unwrap();
        fs::write(source.join("sub/c.wav"), b"wav").unwrap();
        let index_path = dir.path().join("index");
        Fixture {
            _dir: dir,
            source,
            output,
            index_path,
        }
    }

    fn build(fixture: &Fixture, options: ScanOptions) -> (IndexHeader, Vec<Job>) {
        let header = IndexBuilder::new(options).build(&fixture.index_path).unwrap();
        let mut reader = IndexReader::open(&fixture.index_path).unwrap();
        let mut jobs = Vec::new();
        while let Some(job) = reader.next_job().unwrap() {
            jobs.push(job);
        }
        (header, jobs)
    }

    fn output_names(jobs: &[Job], fixture: &Fixture) -> BTreeSet<String> {
        jobs.iter()
            .map(|j| {
                j.output_path
                    .strip_prefix(&fixture.output)
                    .unwrap()
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_recursive_copy_all_scenario() {
        let fixture = fixture();
        let options = ScanOptions::new(&fixture.source, &fixture.output, OutputFormat::Flac)
            .recursive(true)
            .copy_all(true);
        let (header, jobs) = build(&fixture, options);

        assert_eq!(header.total_jobs, 3);
        assert_eq!(header.convert_jobs, 2);
        assert_eq!(
            output_names(&jobs, &fixture),
            BTreeSet::from([
                "a.flac".to_string(),
                "b.txt".to_string(),
                format!("sub{}c.flac", std::path::MAIN_SEPARATOR),
            ])
        );

        let actions: Vec<JobAction> = jobs
            .iter()
            .filter(|j| j.output_path.ends_with("b.txt"))
            .map(|j| j.action)
            .collect();
        assert_eq!(actions, vec![JobAction::Copy]);
    }

    #[test]
    fn test_non_recursive_excludes_subdirectory() {
        let fixture = fixture();
        let options = ScanOptions::new(&fixture.source, &fixture.output, OutputFormat::Flac)
            .copy_all(true);
        let (header, jobs) = build(&fixture, options);

        assert_eq!(header.total_jobs, 2);
        assert_eq!(header.convert_jobs, 1);
        assert!(jobs.iter().all(|j| !j.input_path.ends_with("c.wav")));
    }

    #[test]
    fn test_skip_existing_omits_job_entirely() {
        let fixture = fixture();
        fs::write(fixture.output.join("a.flac"), b"done").unwrap();

        let options = ScanOptions::new(&fixture.source, &fixture.output, OutputFormat::Flac)
            .recursive(true)
            .copy_all(true)
            .skip_existing(true);
        let (header, jobs) = build(&fixture, options);

        assert_eq!(header.total_jobs, 2);
        assert_eq!(header.convert_jobs, 1);
        assert!(jobs.iter().all(|j| !j.input_path.ends_with("a.mp3")));
    }

    #[test]
    fn test_without_copy_all_non_media_omitted() {
        let fixture = fixture();
        let options =
            ScanOptions::new(&fixture.source, &fixture.output, OutputFormat::M4a).recursive(true);
        let (header, jobs) = build(&fixture, options);

        assert_eq!(header.total_jobs, 2);
        assert_eq!(header.convert_jobs, 2);
        assert!(jobs.iter().all(|j| j.action == JobAction::Convert));
    }

    #[test]
    fn test_current_directory_before_subdirectories() {
        let fixture = fixture();
        let options = ScanOptions::new(&fixture.source, &fixture.output, OutputFormat::Flac)
            .recursive(true)
            .copy_all(true);
        let (_, jobs) = build(&fixture, options);

        let sub_position = jobs
            .iter()
            .position(|j| j.input_path.ends_with("c.wav"))
            .unwrap();
        assert_eq!(sub_position, jobs.len() - 1);
    }

    #[test]
    fn test_extensionless_file_copied_as_is() {
        let fixture = fixture();
        fs::write(fixture.source.join("README"), b"readme").unwrap();

        let options = ScanOptions::new(&fixture.source, &fixture.output, OutputFormat::Flac)
            .copy_all(true);
        let (_, jobs) = build(&fixture, options);

        let readme = jobs
            .iter()
            .find(|j| j.input_path.ends_with("README"))
            .unwrap();
        assert_eq!(readme.action, JobAction::Copy);
        assert_eq!(readme.output_path, fixture.output.join("README"));
    }

    #[test]
    fn test_missing_source_root() {
        let dir = TempDir::new().unwrap();
        let options = ScanOptions::new(
            dir.path().join("nope"),
            dir.path().join("out"),
            OutputFormat::Mp3,
        );
        let result = IndexBuilder::new(options).build(&dir.path().join("index"));
        assert!(matches!(result, Err(IndexError::SourceRootUnreadable { .. })));
    }

    #[test]
    fn test_small_flush_batches() {
        let fixture = fixture();
        for i in 0..9 {
            fs::write(fixture.source.join(format!("t{}.mp3", i)), b"x").unwrap();
        }
        let options = ScanOptions::new(&fixture.source, &fixture.output, OutputFormat::Flac)
            .recursive(true)
            .copy_all(true);
        let (header, jobs) = build(&fixture, options.clone());
        assert_eq!(header.total_jobs, 12);

        // Same result with a tiny flush batch.
        let (header_small, jobs_small) = {
            let builder = IndexBuilder::new(options).with_flush_every(2);
            let header = builder.build(&fixture.index_path).unwrap();
            let mut reader = IndexReader::open(&fixture.index_path).unwrap();
            let mut out = Vec::new();
            while let Some(job) = reader.next_job().unwrap() {
                out.push(job);
            }
            (header, out)
        };
        assert_eq!(header_small, header);
        assert_eq!(jobs_small.len(), jobs.len());
    }
}
