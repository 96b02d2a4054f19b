//! HTTP fetcher implementation
//!
//! This module handles all plain HTTP requests for the crawler:
//! - Building the shared HTTP client
//! - Probing a URL's status before handing it to the browser
//! - Fetching raw documents for the static gateway

use crate::config::FetchConfig;
use crate::ScrapeError;
use reqwest::{Client, Response};
use std::time::Duration;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The fetch configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_scrape::config::FetchConfig;
/// use sumi_scrape::crawler::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.timeout_secs.min(10)))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Checks that a URL answers with a success status
///
/// The body is not read. Used before rendering so that error pages are never
/// captured as content.
///
/// # Returns
///
/// * `Ok(())` - Server answered with a 2xx status
/// * `Err(ScrapeError::Fetch)` - Non-success status or network failure
pub async fn probe_status(client: &Client, url: &str) -> Result<(), ScrapeError> {
    send_checked(client, url).await.map(|_| ())
}

/// Fetches the raw document at a URL
///
/// # Returns
///
/// * `Ok(String)` - Body of a 2xx response
/// * `Err(ScrapeError::Fetch)` - Non-success status, network failure, or unreadable body
pub async fn fetch_document(client: &Client, url: &str) -> Result<String, ScrapeError> {
    let response = send_checked(client, url).await?;

    response.text().await.map_err(|e| ScrapeError::Fetch {
        url: url.to_string(),
        reason: format!("failed to read body: {}", e),
    })
}

async fn send_checked(client: &Client, url: &str) -> Result<Response, ScrapeError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| ScrapeError::Fetch {
            url: url.to_string(),
            reason: classify_network_error(&e),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ScrapeError::Fetch {
            url: url.to_string(),
            reason: format!("HTTP {}", status),
        });
    }

    tracing::debug!("{} answered {}", url, status);
    Ok(response)
}

fn classify_network_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "request timeout".to_string()
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}
