use super::{types::Config, ConfigError};

/// Highest CRF accepted by x264.
const MAX_CRF: u8 = 51;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0 and the upload limit is positive
/// - The clip worker pool and default clip length are at least 1
/// - Encoding CRF is within 0-51 and the square frame is not empty
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }
    if config.server.max_upload_mb == 0 {
        return Err(ConfigError::ValidationError(
            "server.max_upload_mb must be at least 1".to_string(),
        ));
    }

    // Jobs validation
    if config.jobs.max_parallel_clips == 0 {
        return Err(ConfigError::ValidationError(
            "jobs.max_parallel_clips must be at least 1".to_string(),
        ));
    }
    if config.jobs.default_clip_length_secs == 0 {
        return Err(ConfigError::ValidationError(
            "jobs.default_clip_length_secs must be at least 1".to_string(),
        ));
    }

    // Encoding validation
    if config.encoding.crf > MAX_CRF {
        return Err(ConfigError::ValidationError(format!(
            "encoding.crf must be between 0 and {}, got {}",
            MAX_CRF, config.encoding.crf
        )));
    }
    if config.encoding.square_size == 0 {
        return Err(ConfigError::ValidationError(
            "encoding.square_size cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = Config::default();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_zero_pool_fails() {
        let mut config = Config::default();
        config.jobs.max_parallel_clips = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("max_parallel_clips"));
    }

    #[test]
    fn test_validate_zero_clip_length_fails() {
        let mut config = Config::default();
        config.jobs.default_clip_length_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_encoding() {
        let mut config = Config::default();
        config.encoding.crf = 52;
        assert!(validate_config(&config).is_err());

        config.encoding.crf = 51;
        assert!(validate_config(&config).is_ok());

        config.encoding.square_size = 0;
        assert!(validate_config(&config).is_err());
    }
}
