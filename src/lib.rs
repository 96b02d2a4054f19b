//! Sumi-Scrape: a rendering web crawler
//!
//! This crate renders pages through a headless browser, extracts a structured
//! record per page (title, text, links, images, language), persists it, and
//! follows discovered links depth-first until every reachable URL has been
//! visited or filtered out.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Sumi-Scrape operations
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("Failed to render {url}: {reason}")]
    Render { url: String, reason: String },

    #[error("HTML parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Failed to persist {url}: {reason}")]
    Persist { url: String, reason: String },

    #[error("Page store unavailable: {0}")]
    Connection(String),

    #[error("Browser session unavailable: {0}")]
    BrowserUnavailable(String),

    #[error("Crawl cancelled")]
    Cancelled,

    #[error("Invalid state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::PageState,
        to: state::PageState,
    },
}

impl ScrapeError {
    /// Returns true for failures that only abort the subtree rooted at one URL
    ///
    /// Everything else (store connection, configuration, cancellation) stops
    /// the whole crawl.
    pub fn is_branch_local(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Render { .. } | Self::Parse { .. } | Self::Persist { .. }
        )
    }

    /// Returns true for failures a bounded retry may recover from
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Render { .. })
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),
}

/// Result type alias for Sumi-Scrape operations
pub type Result<T> = std::result::Result<T, ScrapeError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, CrawlReport};
pub use state::{PageState, VisitedSet};
pub use storage::{PageRecord, PageStore, SqlitePageStore};
