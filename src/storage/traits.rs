//! Storage traits and error types
//!
//! This module defines the trait interface for page store backends and
//! associated error types.

use crate::storage::PageRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid timestamp in stored page: {0}")]
    Timestamp(#[from] chrono::ParseError),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for page store implementations
///
/// The traversal engine owns its store exclusively, so implementations do not
/// need internal synchronization.
pub trait PageStore {
    /// Lists the URL of every stored page, in insertion order
    ///
    /// Called once at startup to seed the visited set.
    fn find_all_urls(&self) -> StorageResult<Vec<String>>;

    /// Persists a page record
    ///
    /// # Returns
    ///
    /// * `Ok(Some(id))` - The identifier the store acknowledged for the record
    /// * `Ok(None)` - The write was not acknowledged; callers treat this as a failure
    /// * `Err(StorageError)` - The store rejected the write
    fn insert(&mut self, page: &PageRecord) -> StorageResult<Option<String>>;

    /// Gets the most recently stored record for a URL
    fn get_page_by_url(&self, url: &str) -> StorageResult<Option<PageRecord>>;

    /// Gets total page count
    fn count_pages(&self) -> StorageResult<u64>;

    /// Gets page counts per declared language, most common first
    fn count_by_language(&self) -> StorageResult<Vec<(String, u64)>>;
}
