//! URL handling module for Sumi-Scrape
//!
//! This module provides base URL validation, relative reference resolution,
//! and the eligibility filter applied to discovered links.

mod filter;

use crate::{UrlError, UrlResult};
use ::url::Url;

// Re-export main functions
pub use filter::{is_eligible, UrlFilter};

/// Scheme prefixes a crawlable URL must start with
pub const NETWORK_SCHEME_PREFIXES: &[&str] = &["http://", "https://"];

/// Returns true if the string starts with an HTTP or HTTPS scheme prefix
///
/// This is a plain prefix check on the string as given. No parsing or case
/// folding is performed.
pub fn has_network_scheme(candidate: &str) -> bool {
    NETWORK_SCHEME_PREFIXES
        .iter()
        .any(|prefix| candidate.starts_with(prefix))
}

/// Parses a page URL that will serve as the base for resolving references
///
/// The URL must be absolute and use the `http` or `https` scheme.
///
/// # Examples
///
/// ```
/// use sumi_scrape::url::parse_base_url;
///
/// assert!(parse_base_url("https://example.com/docs/").is_ok());
/// assert!(parse_base_url("/docs/").is_err());
/// assert!(parse_base_url("ftp://example.com/").is_err());
/// ```
pub fn parse_base_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    Ok(url)
}

/// Resolves a reference (href, src) against a base URL
///
/// Returns `None` for blank references and for references that cannot be
/// resolved. Callers treat `None` as "skip this attribute".
pub fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    base.join(reference).ok()
}
