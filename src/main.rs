//! Sumi-Scrape main entry point
//!
//! This is the command-line interface for the Sumi-Scrape rendering crawler.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use sumi_scrape::config::{
    apply_env_overrides, load_config_with_hash, validate, Config, RenderMode,
};
use sumi_scrape::crawler::{
    BrowserGateway, Coordinator, CrawlOptions, RenderGateway, StaticGateway,
};
use sumi_scrape::output::{load_statistics, print_statistics};
use sumi_scrape::storage::{PageStore, SqlitePageStore};
use sumi_scrape::url::parse_base_url;
use sumi_scrape::ScrapeError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Sumi-Scrape: a rendering web crawler
///
/// Sumi-Scrape renders pages in a headless browser, stores a structured
/// record of each one, and follows every discovered link depth-first until
/// nothing new is reachable. Pages already in the store are never fetched
/// again, so an interrupted crawl can simply be restarted.
#[derive(Parser, Debug)]
#[command(name = "sumi-scrape")]
#[command(version = "1.0.0")]
#[command(about = "A rendering web crawler", long_about = None)]
struct Cli {
    /// URL to start crawling from
    #[arg(value_name = "SEED_URL", required_unless_present_any = ["stats", "dry_run"])]
    seed: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Browser locale (e.g. de-DE)
    #[arg(long, value_name = "LOCALE")]
    lang: Option<String>,

    /// WebDriver server URL
    #[arg(long, value_name = "URL")]
    webdriver_url: Option<String>,

    /// Fetch raw documents over HTTP instead of rendering them in a browser
    #[arg(long = "static")]
    static_render: bool,

    /// Accept links whose only colon introduces a port number
    #[arg(long)]
    allow_explicit_ports: bool,

    /// Retries after a fetch or render failure
    #[arg(long, value_name = "N")]
    max_retries: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print the effective configuration and exit without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show page counts from the store and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            tracing::warn!("Ignoring unreadable .env file: {}", e);
        }
    }

    let config = resolve_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, cli.seed.as_deref());
        Ok(())
    } else if cli.stats {
        handle_stats(&config)
    } else {
        let seed = cli
            .seed
            .as_deref()
            .context("a seed URL is required to crawl")?;
        handle_crawl(config, seed).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scrape=info,warn"),
            1 => EnvFilter::new("sumi_scrape=debug,info"),
            2 => EnvFilter::new("sumi_scrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Builds the effective configuration: defaults, file, environment, flags
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .map_err(ScrapeError::Config)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config);

    if let Some(lang) = &cli.lang {
        config.render.language = lang.clone();
    }
    if let Some(webdriver_url) = &cli.webdriver_url {
        config.render.webdriver_url = webdriver_url.clone();
    }
    if cli.static_render {
        config.render.mode = RenderMode::Static;
    }
    if cli.allow_explicit_ports {
        config.filter.allow_explicit_ports = true;
    }
    if let Some(max_retries) = cli.max_retries {
        config.fetch.max_retries = max_retries;
    }

    validate(&config)
        .map_err(ScrapeError::Config)
        .context("invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, seed: Option<&str>) {
    println!("=== Sumi-Scrape Dry Run ===\n");

    println!("Store:");
    println!("  URI: {}", config.store.uri);
    println!("  Namespace: {}", config.store.namespace);

    println!("\nRender:");
    println!("  Mode: {:?}", config.render.mode);
    if config.render.mode == RenderMode::Browser {
        println!("  WebDriver: {}", config.render.webdriver_url);
        println!("  Headless: {}", config.render.headless);
    }
    println!("  Language: {}", config.render.language);
    println!("  Settle delay: {}ms", config.render.settle_delay_ms);
    println!("  Wait timeout: {}s", config.render.wait_timeout_secs);

    println!("\nFetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!(
        "  Retries: {} (backoff {}ms)",
        config.fetch.max_retries, config.fetch.retry_backoff_ms
    );

    println!("\nFilter:");
    println!(
        "  Explicit ports allowed: {}",
        config.filter.allow_explicit_ports
    );

    println!("\n✓ Configuration is valid");
    match seed {
        Some(seed) => println!("✓ Would start crawling from {}", seed),
        None => println!("  No seed URL given"),
    }
}

/// Handles the --stats mode: shows page counts from the store
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Store: {}\n", config.store.uri);

    let store = SqlitePageStore::open(&config.store.uri, &config.store.namespace)
        .with_context(|| format!("failed to open page store at {}", config.store.uri))?;

    let stats = load_statistics(&store, store.namespace())
        .context("failed to read page statistics")?;

    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, seed: &str) -> anyhow::Result<()> {
    parse_base_url(seed).with_context(|| format!("invalid seed URL {}", seed))?;

    let store = SqlitePageStore::open(&config.store.uri, &config.store.namespace)
        .with_context(|| format!("failed to open page store at {}", config.store.uri))?;
    tracing::info!(
        "Page store {} (namespace {})",
        config.store.uri,
        config.store.namespace
    );

    let options = CrawlOptions::from_config(&config);
    let token = CancellationToken::new();

    tokio::spawn({
        let token = token.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupt received, stopping crawl");
                token.cancel();
            }
        }
    });

    match config.render.mode {
        RenderMode::Browser => {
            let gateway = BrowserGateway::connect(&config.render, &config.fetch)
                .await
                .context("failed to start browser session")?;
            let mut coordinator =
                browser_coordinator(gateway, store, options).await?.with_cancellation(token);

            let result = run_crawl(&mut coordinator, seed).await;

            let (gateway, _) = coordinator.into_parts();
            gateway.shutdown().await;
            result
        }
        RenderMode::Static => {
            let gateway =
                StaticGateway::new(&config.fetch).context("failed to build HTTP client")?;
            let mut coordinator =
                Coordinator::new(gateway, store, options)?.with_cancellation(token);

            run_crawl(&mut coordinator, seed).await
        }
    }
}

/// Builds a coordinator around a browser session, ending the session if that fails
async fn browser_coordinator<S: PageStore>(
    gateway: BrowserGateway,
    store: S,
    options: CrawlOptions,
) -> Result<Coordinator<BrowserGateway, S>, ScrapeError> {
    match Coordinator::new(gateway.clone(), store, options) {
        Ok(coordinator) => Ok(coordinator),
        Err(e) => {
            gateway.shutdown().await;
            Err(e)
        }
    }
}

async fn run_crawl<G: RenderGateway>(
    coordinator: &mut Coordinator<G, SqlitePageStore>,
    seed: &str,
) -> anyhow::Result<()> {
    match coordinator.crawl(seed).await {
        Ok(report) if report.cancelled => {
            tracing::warn!("Crawl interrupted: {}", report);
            Ok(())
        }
        Ok(report) => {
            tracing::info!("Crawl completed successfully: {}", report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e).with_context(|| format!("crawl from {} failed", seed))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use sumi_scrape::config::{FetchConfig, RenderConfig};
    use sumi_scrape::ConfigError;
    use sumi_scrape::storage::{PageRecord, StorageError, StorageResult};
    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct OfflineStore;

    impl PageStore for OfflineStore {
        fn find_all_urls(&self) -> StorageResult<Vec<String>> {
            Err(StorageError::Connection("connection refused".to_string()))
        }
        fn insert(&mut self, _page: &PageRecord) -> StorageResult<Option<String>> {
            Err(StorageError::Connection("connection refused".to_string()))
        }
        fn get_page_by_url(&self, _url: &str) -> StorageResult<Option<PageRecord>> {
            Ok(None)
        }
        fn count_pages(&self) -> StorageResult<u64> {
            Ok(0)
        }
        fn count_by_language(&self) -> StorageResult<Vec<(String, u64)>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_invalid_config_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[fetch]\nmax-retries = 1000").unwrap();

        let cli = Cli::try_parse_from([
            "sumi-scrape",
            "--config",
            file.path().to_str().unwrap(),
            "https://example.com/",
        ])
        .unwrap();

        let err = resolve_config(&cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScrapeError>(),
            Some(ScrapeError::Config(ConfigError::Validation(_)))
        ));
    }

    #[test]
    fn test_unparsable_config_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[store").unwrap();

        let cli = Cli::try_parse_from([
            "sumi-scrape",
            "--config",
            file.path().to_str().unwrap(),
            "--stats",
        ])
        .unwrap();

        let err = resolve_config(&cli).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScrapeError>(),
            Some(ScrapeError::Config(ConfigError::Parse(_)))
        ));
    }

    #[tokio::test]
    async fn test_browser_session_closed_when_store_is_unreachable() {
        let driver = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": {
                    "sessionId": "s1",
                    "capabilities": { "browserName": "chrome" }
                }
            })))
            .mount(&driver)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/session/s1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": null })),
            )
            .expect(1..)
            .mount(&driver)
            .await;

        let render = RenderConfig {
            webdriver_url: driver.uri(),
            ..RenderConfig::default()
        };
        let gateway = BrowserGateway::connect(&render, &FetchConfig::default())
            .await
            .unwrap();

        let result = browser_coordinator(gateway, OfflineStore, CrawlOptions::default()).await;

        assert!(matches!(result, Err(ScrapeError::Connection(_))));
        driver.verify().await;
    }
}
