use super::{types::Config, ConfigError};

/// Smallest accepted refresh interval.
pub const MIN_REFRESH_INTERVAL_MS: u64 = 500;

/// Validate configuration
/// Currently validates:
/// - Backend section exists (enforced by serde)
/// - Server port is not 0
/// - Backend URL is http(s) and the timeout is not 0
/// - Refresh interval is at least 500ms
/// - Board limits are not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    // Backend validation
    let url = config.backend.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "backend.url must start with http:// or https://, got '{}'",
            config.backend.url
        )));
    }
    if config.backend.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "backend.timeout_secs cannot be 0".to_string(),
        ));
    }

    // Refresh validation
    if config.refresh.interval_ms < MIN_REFRESH_INTERVAL_MS {
        return Err(ConfigError::ValidationError(format!(
            "refresh.interval_ms must be at least {}",
            MIN_REFRESH_INTERVAL_MS
        )));
    }

    // Board validation
    let boards = &config.boards;
    for (name, value) in [
        ("boards.waiting", boards.waiting),
        ("boards.attention_waiting", boards.attention_waiting),
        ("boards.dashboard_waiting", boards.dashboard_waiting),
    ] {
        if value == 0 {
            return Err(ConfigError::ValidationError(format!("{} cannot be 0", name)));
        }
    }
    if boards.attention_serving == Some(0) {
        return Err(ConfigError::ValidationError(
            "boards.attention_serving cannot be 0".to_string(),
        ));
    }

    Ok(())
}
