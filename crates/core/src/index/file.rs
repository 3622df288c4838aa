//! On-disk index persistence.
//!
//! The index is UTF-8 text: a header line `<total_jobs>, <convert_jobs>`
//! followed by one record per job. Totals are only known once the scan
//! finishes, so the writer streams records to a temporary body file in
//! batches, then prepends the header and atomically installs the result with
//! a rename. An aborted build never leaves a partial index visible.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use super::error::IndexError;
use super::record::{decode_job, encode_job};
use super::types::{IndexHeader, Job, JobAction};

/// Default number of records buffered in memory before a flush to disk.
pub const DEFAULT_FLUSH_EVERY: usize = 1000;

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(suffix);
    path.with_file_name(name)
}

/// Streaming index writer with batched flushes and atomic install.
pub struct IndexWriter {
    final_path: PathBuf,
    body_path: PathBuf,
    body: BufWriter<File>,
    buffer: Vec<String>,
    flush_every: usize,
    header: IndexHeader,
    finished: bool,
}

impl IndexWriter {
    /// Starts a new index at `path`. Nothing is visible at `path` until
    /// [`finish`](Self::finish) succeeds.
    pub fn create(path: &Path, flush_every: usize) -> Result<Self, IndexError> {
        let body_path = sibling(path, ".body.tmp");
        let body = BufWriter::new(File::create(&body_path)?);
        Ok(Self {
            final_path: path.to_path_buf(),
            body_path,
            body,
            buffer: Vec::new(),
            flush_every: flush_every.max(1),
            header: IndexHeader::default(),
            finished: false,
        })
    }

    /// Records one job. Flushes to the body file every `flush_every` records
    /// to bound peak memory on very large trees.
    pub fn append(&mut self, job: &Job) -> Result<(), IndexError> {
        self.header.total_jobs += 1;
        if job.action == JobAction::Convert {
            self.header.convert_jobs += 1;
        }
        self.buffer.push(encode_job(job));
        if self.buffer.len() >= self.flush_every {
            self.flush_buffer()?;
        }
        Ok(())
    }

    /// Totals accumulated so far.
    pub fn header(&self) -> IndexHeader {
        self.header
    }

    fn flush_buffer(&mut self) -> Result<(), IndexError> {
        for line in self.buffer.drain(..) {
            self.body.write_all(line.as_bytes())?;
            self.body.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Finalizes the header and atomically installs the index file.
    pub fn finish(mut self) -> Result<IndexHeader, IndexError> {
        self.flush_buffer()?;
        self.body.flush()?;
        self.body.get_ref().sync_all()?;

        let install_path = sibling(&self.final_path, ".tmp");
        {
            let mut out = BufWriter::new(File::create(&install_path)?);
            writeln!(out, "{}, {}", self.header.total_jobs, self.header.convert_jobs)?;
            let mut body = File::open(&self.body_path)?;
            io::copy(&mut body, &mut out)?;
            out.flush()?;
            out.get_ref().sync_all()?;
        }
        fs::rename(&install_path, &self.final_path)?;
        fs::remove_file(&self.body_path)?;
        self.finished = true;

        debug!(
            path = %self.final_path.display(),
            total_jobs = self.header.total_jobs,
            convert_jobs = self.header.convert_jobs,
            "index installed"
        );
        Ok(self.header)
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        if !self.finished {
            let _ = fs::remove_file(&self.body_path);
            let _ = fs::remove_file(sibling(&self.final_path, ".tmp"));
        }
    }
}

/// Sequential index reader.
pub struct IndexReader {
    reader: BufReader<File>,
    header: IndexHeader,
    /// 1-based line number of the last line read (header is line 1).
    line: u64,
    jobs_read: u64,
}

impl IndexReader {
    /// Opens an index and parses its header.
    pub fn open(path: &Path) -> Result<Self, IndexError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                IndexError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                IndexError::Io(e)
            }
        })?;
        let mut reader = BufReader::new(file);

        let mut header_line = String::new();
        let read = reader.read_line(&mut header_line)?;
        if read == 0 {
            return Err(IndexError::malformed(1, "empty index file"));
        }
        let header = Self::parse_header(header_line.trim())?;

        Ok(Self {
            reader,
            header,
            line: 1,
            jobs_read: 0,
        })
    }

    fn parse_header(line: &str) -> Result<IndexHeader, IndexError> {
        let mut parts = line.split(',');
        let total = parts
            .next()
            .map(str::trim)
            .and_then(|s| s.parse::<u64>().ok());
        let convert = parts
            .next()
            .map(str::trim)
            .and_then(|s| s.parse::<u64>().ok());
        let (total_jobs, convert_jobs) = match (total, convert, parts.next()) {
            (Some(t), Some(c), None) => (t, c),
            _ => return Err(IndexError::malformed(1, format!("invalid header {:?}", line))),
        };
        if convert_jobs > total_jobs {
            return Err(IndexError::malformed(
                1,
                format!("convert_jobs {} exceeds total_jobs {}", convert_jobs, total_jobs),
            ));
        }
        Ok(IndexHeader {
            total_jobs,
            convert_jobs,
        })
    }

    /// Header totals.
    pub fn header(&self) -> IndexHeader {
        self.header
    }

    /// Number of jobs returned by [`next_job`](Self::next_job) so far.
    pub fn jobs_read(&self) -> u64 {
        self.jobs_read
    }

    /// Reads the next job, or `None` at end of file.
    pub fn next_job(&mut self) -> Result<Option<Job>, IndexError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line)?;
            if read == 0 {
                return Ok(None);
            }
            self.line += 1;
            let trimmed = line.trim_end_matches(['\n', '\r']);
            if trimmed.is_empty() {
                // Tolerate a blank trailing line.
                continue;
            }
            let job = decode_job(trimmed, self.line)?;
            self.jobs_read += 1;
            return Ok(Some(job));
        }
    }
}
