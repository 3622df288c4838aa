//! Testing utilities and mock implementations.
//!
//! Provides a mock [`Converter`](crate::converter::Converter) so the
//! scheduler and batch coordinator can be exercised end to end without
//! ffmpeg installed.

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion};
