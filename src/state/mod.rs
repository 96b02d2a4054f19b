//! State module for tracking crawl progress
//!
//! This module provides the in-memory state the traversal engine owns during
//! a crawl run.
//!
//! # Components
//!
//! - `PageState`: Tracks where a single URL is in the visit pipeline
//! - `PageProgress`: Walks one URL through validated `PageState` transitions
//! - `VisitedSet`: URLs already processed, seeded from the page store

mod page_state;
mod visited;

// Re-export main types
pub use page_state::{PageProgress, PageState};
pub use visited::VisitedSet;
