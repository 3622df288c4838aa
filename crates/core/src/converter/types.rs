//! Types for the converter module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// File extensions the pipeline will hand to the codec tool. Everything else
/// is copied (or skipped) rather than converted.
pub const CONVERTIBLE_INPUT_EXTENSIONS: &[&str] = &[
    // Audio formats
    "aiff", "aif", "au", "flac", "m4a", "mp3", "ogg", "wav", "webm", "aac",
    // Video formats (the audio track is extracted)
    "flv", "ogv", "mov", "mp4", "m4v", "mpg", "mpeg", "mp2", "mpe", "m2v",
];

/// Whether a file extension is on the convertible-input allow-list.
pub fn is_convertible_input(extension: &str) -> bool {
    CONVERTIBLE_INPUT_EXTENSIONS
        .iter()
        .any(|e| e.eq_ignore_ascii_case(extension))
}

/// Target output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// Audio Interchange File Format (lossless)
    Aiff,
    /// MPEG Audio Layer III
    Mp3,
    /// AAC in an MPEG-4 container
    M4a,
    /// Free Lossless Audio Codec
    Flac,
}

impl OutputFormat {
    /// All supported output formats.
    pub const ALL: &'static [Self] = &[Self::Aiff, Self::Mp3, Self::M4a, Self::Flac];

    /// Returns the file extension for this format. The codec tool infers the
    /// encoder from it.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Aiff => "aiff",
            Self::Mp3 => "mp3",
            Self::M4a => "m4a",
            Self::Flac => "flac",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aiff" => Ok(Self::Aiff),
            "mp3" => Ok(Self::Mp3),
            "m4a" => Ok(Self::M4a),
            "flac" => Ok(Self::Flac),
            other => Err(format!(
                "unsupported output format {:?} (expected one of aiff, mp3, m4a, flac)",
                other
            )),
        }
    }
}

/// One conversion handed to a [`Converter`](super::Converter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    /// Identifier used in logs and progress messages.
    pub job_id: String,
    /// Source file.
    pub input_path: PathBuf,
    /// Destination file. Parent directories are created by the converter.
    pub output_path: PathBuf,
}

/// Result of a successful conversion.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub job_id: String,
    pub output_path: PathBuf,
    pub output_size_bytes: u64,
    pub duration_ms: u64,
}

/// Progress update emitted while a conversion runs.
#[derive(Debug, Clone)]
pub struct ConversionProgress {
    pub job_id: String,
    /// Seconds of output produced so far.
    pub out_time_secs: f64,
    /// Encoder speed as reported by the tool, e.g. `"12.5x"`.
    pub speed: Option<String>,
}
