//! Converter module: the external codec step behind a trait.
//!
//! The pipeline never interprets media bitstreams itself; a [`Converter`]
//! takes an input path and an output path and either the output exists on
//! return or the error carries the tool's diagnostic text. The shipped
//! implementation shells out to ffmpeg.
//!
//! # Example
//!
//! ```ignore
//! use rekonvert_core::converter::{ConversionJob, Converter, FfmpegConverter};
//!
//! let converter = FfmpegConverter::with_defaults();
//! converter.validate().await?;
//!
//! let result = converter
//!     .convert(ConversionJob {
//!         job_id: "job-0".to_string(),
//!         input_path: "/music/track.mp3".into(),
//!         output_path: "/converted/track.flac".into(),
//!     })
//!     .await?;
//! println!("Converted in {} ms", result.duration_ms);
//! ```

mod config;
mod error;
mod ffmpeg;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use ffmpeg::FfmpegConverter;
pub use traits::Converter;
pub use types::{
    is_convertible_input, ConversionJob, ConversionProgress, ConversionResult, OutputFormat,
    CONVERTIBLE_INPUT_EXTENSIONS,
};
