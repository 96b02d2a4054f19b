//! Eligibility filter for discovered links
//!
//! A candidate is eligible when, checked in order:
//! 1. it starts with `http://` or `https://`
//! 2. it is not already in the visited set (exact string match)
//! 3. it has no colon after the scheme delimiter
//!
//! Rule 3 keeps out pseudo-schemes and embedded credentials that slipped past
//! rule 1. It also rejects URLs with an explicit port unless
//! `allow_explicit_ports` is switched on.

use crate::state::VisitedSet;
use crate::url::has_network_scheme;

const SCHEME_DELIMITER: &str = "://";

/// URL eligibility filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UrlFilter {
    /// Let a single `:port` in the authority pass rule 3
    pub allow_explicit_ports: bool,
}

impl UrlFilter {
    /// Creates a filter with the given port policy
    pub fn new(allow_explicit_ports: bool) -> Self {
        Self {
            allow_explicit_ports,
        }
    }

    /// Decides whether a discovered URL may be visited
    ///
    /// Pure predicate over the current visited set.
    pub fn is_eligible(&self, candidate: &str, visited: &VisitedSet) -> bool {
        if !has_network_scheme(candidate) {
            return false;
        }

        if visited.contains(candidate) {
            return false;
        }

        !self.has_colon_after_scheme(candidate)
    }

    fn has_colon_after_scheme(&self, candidate: &str) -> bool {
        let rest = match candidate.find(SCHEME_DELIMITER) {
            Some(idx) => &candidate[idx + SCHEME_DELIMITER.len()..],
            None => candidate,
        };

        if !rest.contains(':') {
            return false;
        }

        let port_only = colon_is_port_delimiter(rest);
        if self.allow_explicit_ports && port_only {
            return false;
        }

        if port_only {
            tracing::debug!(
                "Rejected {} only because it carries an explicit port",
                candidate
            );
        }

        true
    }
}

/// Returns true if the only colon after the scheme introduces a numeric port
fn colon_is_port_delimiter(rest: &str) -> bool {
    let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    let (authority, tail) = rest.split_at(authority_end);

    // Credentials and colons outside the authority never count as a port
    if tail.contains(':') || authority.contains('@') {
        return false;
    }

    match authority.split_once(':') {
        Some((host, port)) => {
            !host.is_empty() && !port.is_empty() && port.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Checks eligibility with the default filter (explicit ports rejected)
///
/// # Examples
///
/// ```
/// use sumi_scrape::state::VisitedSet;
/// use sumi_scrape::url::is_eligible;
///
/// let visited = VisitedSet::new();
/// assert!(is_eligible("https://example.com/about", &visited));
/// assert!(!is_eligible("mailto:someone@example.com", &visited));
/// ```
pub fn is_eligible(candidate: &str, visited: &VisitedSet) -> bool {
    UrlFilter::default().is_eligible(candidate, visited)
}
