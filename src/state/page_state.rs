//! Page state definitions for tracking crawl progress
//!
//! This module defines the states a URL moves through while the traversal
//! engine visits it. The states are never persisted; they exist to keep the
//! visit pipeline honest and to drive logging.

use crate::ScrapeError;
use std::fmt;

/// Represents the current state of a URL in the visit pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    // ===== Active States =====
    /// URL has been discovered but not yet touched
    Unvisited,

    /// Markup is being fetched and rendered
    Fetching,

    /// A page record has been built from the rendered markup
    Extracted,

    /// The page record has been written to the page store
    Persisted,

    /// Outbound links of the page are being traversed
    Expanding,

    // ===== Terminal States =====
    /// Page and its whole subtree are finished
    Done,

    /// URL was ineligible or already visited
    Skipped,

    /// Fetch, render, extraction or persistence failed
    Failed,
}

impl PageState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped | Self::Failed)
    }

    /// Returns true if the transition `self -> next` is allowed
    pub fn can_transition_to(&self, next: PageState) -> bool {
        use PageState::*;

        matches!(
            (self, next),
            (Unvisited, Fetching)
                | (Unvisited, Skipped)
                | (Fetching, Extracted)
                | (Fetching, Failed)
                | (Extracted, Persisted)
                | (Extracted, Failed)
                | (Persisted, Expanding)
                | (Persisted, Done)
                | (Expanding, Done)
        )
    }

    /// Short lowercase name used in log output
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unvisited => "unvisited",
            Self::Fetching => "fetching",
            Self::Extracted => "extracted",
            Self::Persisted => "persisted",
            Self::Expanding => "expanding",
            Self::Done => "done",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
        }
    }

    /// Returns all possible page states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Unvisited,
            Self::Fetching,
            Self::Extracted,
            Self::Persisted,
            Self::Expanding,
            Self::Done,
            Self::Skipped,
            Self::Failed,
        ]
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Tracks a single URL through its state transitions
#[derive(Debug, Clone)]
pub struct PageProgress {
    url: String,
    state: PageState,
}

impl PageProgress {
    /// Starts tracking a URL in the `Unvisited` state
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            state: PageState::Unvisited,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    /// Moves to the next state
    ///
    /// # Returns
    ///
    /// * `Ok(())` - Transition applied
    /// * `Err(ScrapeError::InvalidTransition)` - Transition not allowed from the current state
    pub fn advance(&mut self, next: PageState) -> Result<(), ScrapeError> {
        if !self.state.can_transition_to(next) {
            return Err(ScrapeError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }

        tracing::trace!("{}: {} -> {}", self.url, self.state, next);
        self.state = next;
        Ok(())
    }

    /// Marks the URL as failed if it is still active
    pub fn fail(&mut self) {
        if self.state.can_transition_to(PageState::Failed) {
            tracing::trace!("{}: {} -> {}", self.url, self.state, PageState::Failed);
            self.state = PageState::Failed;
        }
    }
}
