//! Configuration module for Sumi-Scrape
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables, then command-line flags.
//!
//! # Example
//!
//! ```no_run
//! use sumi_scrape::config::{apply_env_overrides, load_config};
//! use std::path::Path;
//!
//! let mut config = load_config(Path::new("scrape.toml")).unwrap();
//! apply_env_overrides(&mut config);
//! println!("Pages go to: {}", config.store.uri);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, FetchConfig, FilterConfig, RenderConfig, RenderMode, StoreConfig};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, apply_overrides_from, compute_config_hash, load_config,
    load_config_with_hash, DATABASE_NAME_ENV, STORE_URI_ENV, WEBDRIVER_URL_ENV,
};
pub use validation::validate;
