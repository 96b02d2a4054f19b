//! Render gateways
//!
//! A render gateway turns a URL into settled document markup. The browser
//! gateway drives a headless browser over WebDriver so client-side scripts
//! run before capture; the static gateway returns the document as served.

use crate::config::{FetchConfig, RenderConfig};
use crate::crawler::fetcher::{build_http_client, fetch_document, probe_status};
use crate::ScrapeError;
use async_trait::async_trait;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Value};
use std::time::Duration;

/// Script returning the full rendered document
const OUTER_HTML_SCRIPT: &str = "return document.documentElement.outerHTML;";

/// Produces rendered markup for a URL
#[async_trait]
pub trait RenderGateway: Send + Sync {
    /// Renders a page and returns its markup
    ///
    /// A non-success HTTP status is reported as `ScrapeError::Fetch`;
    /// navigation and capture failures as `ScrapeError::Render`.
    async fn render(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Renders pages in a headless browser through a WebDriver server
///
/// Clones share one browser session.
#[derive(Clone)]
pub struct BrowserGateway {
    client: Client,
    http: reqwest::Client,
    settle_delay: Duration,
    wait_timeout: Duration,
}

impl BrowserGateway {
    /// Opens a browser session on the configured WebDriver server
    ///
    /// # Returns
    ///
    /// * `Ok(BrowserGateway)` - Session created
    /// * `Err(ScrapeError::BrowserUnavailable)` - Server unreachable or session refused
    pub async fn connect(render: &RenderConfig, fetch: &FetchConfig) -> Result<Self, ScrapeError> {
        let http = build_http_client(fetch)
            .map_err(|e| ScrapeError::BrowserUnavailable(format!("HTTP client: {}", e)))?;

        let mut builder = ClientBuilder::native();
        builder.capabilities(browser_capabilities(render));

        let client = builder.connect(&render.webdriver_url).await.map_err(|e| {
            ScrapeError::BrowserUnavailable(format!("{}: {}", render.webdriver_url, e))
        })?;

        tracing::info!(
            "Connected to WebDriver at {} (lang {})",
            render.webdriver_url,
            render.language
        );

        Ok(Self {
            client,
            http,
            settle_delay: Duration::from_millis(render.settle_delay_ms),
            wait_timeout: Duration::from_secs(render.wait_timeout_secs),
        })
    }

    /// Ends the browser session
    pub async fn shutdown(self) {
        if let Err(e) = self.client.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }
    }

    fn render_error(url: &str, step: &str, error: impl std::fmt::Display) -> ScrapeError {
        ScrapeError::Render {
            url: url.to_string(),
            reason: format!("{}: {}", step, error),
        }
    }
}

#[async_trait]
impl RenderGateway for BrowserGateway {
    async fn render(&self, url: &str) -> Result<String, ScrapeError> {
        probe_status(&self.http, url).await?;

        tokio::time::sleep(self.settle_delay).await;

        self.client
            .goto(url)
            .await
            .map_err(|e| Self::render_error(url, "navigation failed", e))?;

        self.client
            .wait()
            .at_most(self.wait_timeout)
            .for_element(Locator::Css("body"))
            .await
            .map_err(|e| Self::render_error(url, "body never appeared", e))?;

        let markup = self
            .client
            .execute(OUTER_HTML_SCRIPT, vec![])
            .await
            .map_err(|e| Self::render_error(url, "capture failed", e))?;

        match markup {
            Value::String(html) => Ok(html),
            other => Err(Self::render_error(
                url,
                "capture failed",
                format!("expected markup string, got {}", other),
            )),
        }
    }
}

/// Fetches documents over plain HTTP without running scripts
pub struct StaticGateway {
    http: reqwest::Client,
}

impl StaticGateway {
    pub fn new(fetch: &FetchConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: build_http_client(fetch)?,
        })
    }
}

#[async_trait]
impl RenderGateway for StaticGateway {
    async fn render(&self, url: &str) -> Result<String, ScrapeError> {
        fetch_document(&self.http, url).await
    }
}

/// Builds the WebDriver capabilities for a Chrome session
pub fn browser_capabilities(render: &RenderConfig) -> Capabilities {
    let mut args = Vec::new();
    if render.headless {
        args.push("--headless".to_string());
    }
    args.push(format!("--lang={}", render.language));
    args.push("--disable-gpu".to_string());

    let mut caps = Capabilities::new();
    caps.insert("browserName".to_string(), json!("chrome"));
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({
            "args": args,
            "prefs": { "intl.accept_languages": render.language },
        }),
    );
    caps
}
