use serde::Deserialize;

/// Main configuration structure for Sumi-Scrape
///
/// Every section is optional in the TOML file; missing values fall back to
/// the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

/// Page store location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database path (optionally prefixed with `sqlite://`)
    pub uri: String,

    /// Partition of the store this crawl reads and writes
    pub namespace: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            uri: "sumi-scrape.db".to_string(),
            namespace: "web_scraper".to_string(),
        }
    }
}

/// How pages are turned into markup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Headless browser through a WebDriver server
    Browser,
    /// Plain HTTP GET, no client-side execution
    Static,
}

/// Render gateway configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub mode: RenderMode,

    /// URL of the WebDriver server (e.g., chromedriver)
    #[serde(rename = "webdriver-url")]
    pub webdriver_url: String,

    /// Browser locale, passed as `--lang`
    pub language: String,

    pub headless: bool,

    /// Pause before each navigation (milliseconds)
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    /// Maximum wait for the document body to appear (seconds)
    #[serde(rename = "wait-timeout-secs")]
    pub wait_timeout_secs: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Browser,
            webdriver_url: "http://localhost:4444".to_string(),
            language: "en-US".to_string(),
            headless: true,
            settle_delay_ms: 500,
            wait_timeout_secs: 30,
        }
    }
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Extra attempts after a fetch or render failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Delay before the first retry, doubled for each further retry (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: format!("SumiScrape/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
            max_retries: 0,
            retry_backoff_ms: 1000,
        }
    }
}

/// Link filter configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Accept URLs whose only colon after the scheme introduces a port
    #[serde(rename = "allow-explicit-ports")]
    pub allow_explicit_ports: bool,
}
