//! Statistics generation from the page store
//!
//! This module provides functionality for extracting and displaying
//! page counts from the storage layer.

use crate::storage::{PageStore, StorageResult};
use std::fmt::Write;

/// Page store statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStatistics {
    /// Namespace the counts were taken from
    pub namespace: String,

    /// Total number of stored pages
    pub total_pages: u64,

    /// Count of pages per declared language, most frequent first
    pub pages_by_language: Vec<(String, u64)>,
}

/// Loads statistics from a page store
///
/// # Arguments
///
/// * `store` - The page store to query
/// * `namespace` - Namespace label for the report
///
/// # Returns
///
/// * `Ok(PageStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query the store
pub fn load_statistics<S>(store: &S, namespace: &str) -> StorageResult<PageStatistics>
where
    S: PageStore + ?Sized,
{
    Ok(PageStatistics {
        namespace: namespace.to_string(),
        total_pages: store.count_pages()?,
        pages_by_language: store.count_by_language()?,
    })
}

/// Formats statistics as a plain-text report
pub fn format_statistics(stats: &PageStatistics) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "=== Page Store Statistics ===\n");
    let _ = writeln!(out, "Overview:");
    let _ = writeln!(out, "  Namespace: {}", stats.namespace);
    let _ = writeln!(out, "  Total pages stored: {}", stats.total_pages);
    let _ = writeln!(out);

    if !stats.pages_by_language.is_empty() {
        let _ = writeln!(out, "Pages by Language:");
        for (language, count) in &stats.pages_by_language {
            let percentage = if stats.total_pages > 0 {
                (*count as f64 / stats.total_pages as f64) * 100.0
            } else {
                0.0
            };
            let _ = writeln!(out, "  {}: {} ({:.1}%)", language, count, percentage);
        }
    }

    out
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &PageStatistics) {
    print!("{}", format_statistics(stats));
}
