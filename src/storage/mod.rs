//! Storage module for persisting crawled pages
//!
//! This module handles all page store operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Inserting one record per visited page
//! - Listing known URLs so a restarted crawl skips them
//! - Read-only queries used by the stats report

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqlitePageStore;
pub use traits::{PageStore, StorageError, StorageResult};

use chrono::{DateTime, Utc};

/// Language tag recorded when a document declares none
pub const UNKNOWN_LANGUAGE: &str = "unknown";

/// Represents one fetched page
///
/// A record is built once by the page extractor and never changes afterwards.
/// Fields are only readable from outside the crate.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    pub(crate) id: String,
    pub(crate) url: String,
    pub(crate) fetched_at: DateTime<Utc>,
    pub(crate) title: String,
    pub(crate) raw_markup: String,
    pub(crate) text_content: String,
    pub(crate) links: Vec<String>,
    pub(crate) images: Vec<String>,
    pub(crate) language: String,
}

impl PageRecord {
    /// Opaque identifier assigned when the record was built
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute URL the page was fetched from
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Full rendered markup as captured
    pub fn raw_markup(&self) -> &str {
        &self.raw_markup
    }

    /// Whitespace-normalized body text
    pub fn text_content(&self) -> &str {
        &self.text_content
    }

    /// Absolute outbound link URLs in document order
    pub fn links(&self) -> &[String] {
        &self.links
    }

    /// Absolute image URLs in document order
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}
