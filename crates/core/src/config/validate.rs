use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Library root is not empty
/// - Session pool size and poll interval are not 0
/// - Source base URL is http(s)
/// - Status server port is not 0 when enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.library.root_dir.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "library.root_dir cannot be empty".to_string(),
        ));
    }

    if config.session.max_concurrent_jobs == 0 {
        return Err(ConfigError::ValidationError(
            "session.max_concurrent_jobs cannot be 0".to_string(),
        ));
    }

    if config.session.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "session.poll_interval_ms cannot be 0".to_string(),
        ));
    }

    let base_url = config.source.base_url.as_str();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "source.base_url must be an http(s) URL, got {base_url:?}"
        )));
    }

    if config.status_server.enabled && config.status_server.port == 0 {
        return Err(ConfigError::ValidationError(
            "status_server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}
