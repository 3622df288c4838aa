pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod converter;
pub mod index;
pub mod planner;
pub mod scheduler;
pub mod testing;
pub mod verifier;

pub use batch::{BatchError, BatchRunner, RunOptions, RunReport};
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, IndexConfig,
};
pub use converter::{
    is_convertible_input, ConversionJob, ConversionProgress, ConversionResult, Converter,
    ConverterConfig, ConverterError, FfmpegConverter, OutputFormat, CONVERTIBLE_INPUT_EXTENSIONS,
};
pub use index::{
    IndexBuilder, IndexError, IndexHeader, IndexReader, IndexWriter, Job, JobAction, ScanOptions,
};
pub use scheduler::{
    CancelSource, CancelToken, JobFailure, Phase, RunProgress, ScheduleOutcome, Scheduler,
    SchedulerConfig, SchedulerError,
};
pub use verifier::{verify, MissingOutput};
