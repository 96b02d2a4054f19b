//! Visited set for a crawl run
//!
//! Tracks which URLs the traversal engine has already stored, so each page is
//! rendered at most once per store namespace.
//!
//! # Example
//!
//! ```
//! use sumi_scrape::state::VisitedSet;
//!
//! let mut visited = VisitedSet::from_urls(vec!["https://example.com/".to_string()]);
//! assert!(visited.contains("https://example.com/"));
//! assert!(!visited.contains("https://example.com"));
//! assert!(visited.insert("https://example.com/about"));
//! assert!(!visited.insert("https://example.com/about"));
//! assert_eq!(visited.len(), 2);
//! ```

use std::collections::HashSet;

/// URLs already processed during a crawl run
///
/// Membership is exact string equality. The set only grows: there is no
/// removal API. It is rebuilt at startup from the URLs in the page store and
/// is never persisted on its own.
#[derive(Debug, Clone, Default)]
pub struct VisitedSet {
    urls: HashSet<String>,
}

impl VisitedSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set seeded with previously stored URLs
    pub fn from_urls<I>(urls: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            urls: urls.into_iter().collect(),
        }
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Records a URL as visited
    ///
    /// Returns true if the URL was not present before.
    pub fn insert(&mut self, url: impl Into<String>) -> bool {
        self.urls.insert(url.into())
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
