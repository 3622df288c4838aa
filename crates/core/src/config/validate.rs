use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Index and checkpoint paths are distinct
/// - Flush batch size is nonzero
/// - The ffmpeg path is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.index.index_path == config.index.checkpoint_path {
        return Err(ConfigError::ValidationError(
            "index.index_path and index.checkpoint_path must differ".to_string(),
        ));
    }

    if config.index.flush_every == 0 {
        return Err(ConfigError::ValidationError(
            "index.flush_every cannot be 0".to_string(),
        ));
    }

    if config.converter.ffmpeg_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "converter.ffmpeg_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
