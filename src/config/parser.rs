use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable overriding `store.uri`
pub const STORE_URI_ENV: &str = "STORE_URI";

/// Environment variable overriding `store.namespace`
pub const DATABASE_NAME_ENV: &str = "DATABASE_NAME";

/// Environment variable overriding `render.webdriver-url`
pub const WEBDRIVER_URL_ENV: &str = "WEBDRIVER_URL";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use sumi_scrape::config::load_config;
///
/// let config = load_config(Path::new("scrape.toml")).unwrap();
/// println!("Namespace: {}", config.store.namespace);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so runs can be traced back to the exact configuration.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Applies overrides from the process environment
///
/// Empty variables are ignored.
pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Applies overrides using an arbitrary variable lookup
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(uri) = get(STORE_URI_ENV) {
        tracing::debug!("{} overrides store uri", STORE_URI_ENV);
        config.store.uri = uri;
    }

    if let Some(namespace) = get(DATABASE_NAME_ENV) {
        tracing::debug!("{} overrides store namespace", DATABASE_NAME_ENV);
        config.store.namespace = namespace;
    }

    if let Some(webdriver_url) = get(WEBDRIVER_URL_ENV) {
        tracing::debug!("{} overrides webdriver url", WEBDRIVER_URL_ENV);
        config.render.webdriver_url = webdriver_url;
    }
}
