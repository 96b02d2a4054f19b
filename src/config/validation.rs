use crate::config::types::{Config, FetchConfig, RenderConfig, RenderMode, StoreConfig};
use crate::ConfigError;
use url::Url;

/// Longest accepted pause before navigation (milliseconds)
const MAX_SETTLE_DELAY_MS: u64 = 60_000;

/// Upper bound on retries after a fetch or render failure
const MAX_RETRIES: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_store_config(&config.store)?;
    validate_render_config(&config.render)?;
    validate_fetch_config(&config.fetch)?;
    Ok(())
}

/// Validates page store configuration
fn validate_store_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if config.uri.trim().is_empty() {
        return Err(ConfigError::Validation(
            "store uri cannot be empty".to_string(),
        ));
    }

    if config.namespace.is_empty() {
        return Err(ConfigError::Validation(
            "store namespace cannot be empty".to_string(),
        ));
    }

    if !config
        .namespace
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "store namespace must contain only ASCII letters, digits, '_' and '-', got '{}'",
            config.namespace
        )));
    }

    Ok(())
}

/// Validates render gateway configuration
fn validate_render_config(config: &RenderConfig) -> Result<(), ConfigError> {
    if config.mode == RenderMode::Browser {
        Url::parse(&config.webdriver_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid webdriver-url: {}", e)))?;
    }

    if config.language.trim().is_empty() {
        return Err(ConfigError::Validation(
            "render language cannot be empty".to_string(),
        ));
    }

    if config.settle_delay_ms > MAX_SETTLE_DELAY_MS {
        return Err(ConfigError::Validation(format!(
            "settle-delay-ms must be <= {}ms, got {}ms",
            MAX_SETTLE_DELAY_MS, config.settle_delay_ms
        )));
    }

    if config.wait_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "wait-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates HTTP fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.max_retries > MAX_RETRIES {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= {}, got {}",
            MAX_RETRIES, config.max_retries
        )));
    }

    Ok(())
}
