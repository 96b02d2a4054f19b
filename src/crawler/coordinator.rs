//! Crawler coordinator - depth-first traversal of discovered links
//!
//! The coordinator owns the visited set and the page store for the duration
//! of a run. Traversal uses an explicit stack of frames, one per page being
//! expanded, so arbitrarily long link chains never grow the call stack.

use crate::config::{Config, FetchConfig};
use crate::crawler::parser::extract_at;
use crate::crawler::render::RenderGateway;
use crate::state::{PageProgress, PageState, VisitedSet};
use crate::storage::{PageRecord, PageStore};
use crate::url::UrlFilter;
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Pages between two progress log lines
const PROGRESS_INTERVAL: u64 = 10;

/// Bounded exponential backoff for fetch and render failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first failure
    pub max_retries: u32,
    /// Delay before the first retry
    pub backoff: Duration,
}

impl RetryPolicy {
    /// A single attempt per URL
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Duration::ZERO,
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Delay before retry number `attempt` (zero-based), doubling each time
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Traversal settings
#[derive(Debug, Clone, Copy, Default)]
pub struct CrawlOptions {
    pub filter: UrlFilter,
    pub retry: RetryPolicy,
}

impl CrawlOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            filter: UrlFilter::new(config.filter.allow_explicit_ports),
            retry: RetryPolicy::from_config(&config.fetch),
        }
    }
}

/// Summary of one crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Pages rendered, extracted and stored during this run
    pub pages_persisted: u64,
    /// Start URLs that were already in the visited set
    pub already_visited: u64,
    /// Discovered links rejected by the filter
    pub links_filtered: u64,
    /// Links whose visit failed (their subtrees were not explored)
    pub failed_branches: u64,
    /// True if cancellation stopped the run early
    pub cancelled: bool,
}

impl fmt::Display for CrawlReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} persisted, {} already visited, {} filtered, {} failed",
            self.pages_persisted, self.already_visited, self.links_filtered, self.failed_branches
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

/// Hands out capture timestamps that never go backwards within a run
#[derive(Debug, Default)]
struct RunClock {
    last: Option<DateTime<Utc>>,
}

impl RunClock {
    fn next(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last {
            Some(last) if last > now => last,
            _ => now,
        };
        self.last = Some(stamp);
        stamp
    }
}

/// A page whose links are being walked
struct Frame {
    progress: PageProgress,
    links: Vec<String>,
    cursor: usize,
}

impl Frame {
    fn expand(record: PageRecord, mut progress: PageProgress) -> Result<Self, ScrapeError> {
        progress.advance(PageState::Expanding)?;
        Ok(Self {
            progress,
            links: record.links,
            cursor: 0,
        })
    }

    fn next_link(&mut self) -> Option<String> {
        let link = self.links.get_mut(self.cursor).map(std::mem::take)?;
        self.cursor += 1;
        Some(link)
    }

    fn finish(mut self) -> Result<(), ScrapeError> {
        self.progress.advance(PageState::Done)?;
        tracing::debug!("Finished expanding {}", self.progress.url());
        Ok(())
    }
}

/// Races a future against cancellation
async fn cancellable<T, F>(token: &CancellationToken, fut: F) -> Result<T, ScrapeError>
where
    F: Future<Output = Result<T, ScrapeError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(ScrapeError::Cancelled),
        result = fut => result,
    }
}

/// Main crawler coordinator structure
pub struct Coordinator<G, S> {
    gateway: G,
    store: S,
    visited: VisitedSet,
    failed: HashSet<String>,
    options: CrawlOptions,
    cancel: CancellationToken,
    clock: RunClock,
}

impl<G, S> Coordinator<G, S>
where
    G: RenderGateway,
    S: PageStore,
{
    /// Creates a coordinator, seeding the visited set from the page store
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(ScrapeError::Connection)` - Known URLs could not be listed
    pub fn new(gateway: G, store: S, options: CrawlOptions) -> Result<Self, ScrapeError> {
        let known = store
            .find_all_urls()
            .map_err(|e| ScrapeError::Connection(format!("failed to list known pages: {}", e)))?;

        tracing::info!("Loaded {} known URLs from the page store", known.len());

        Ok(Self {
            gateway,
            store,
            visited: VisitedSet::from_urls(known),
            failed: HashSet::new(),
            options,
            cancel: CancellationToken::new(),
            clock: RunClock::default(),
        })
    }

    /// Uses the given token to stop the crawl
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn visited(&self) -> &VisitedSet {
        &self.visited
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Releases the gateway and the store
    pub fn into_parts(self) -> (G, S) {
        (self.gateway, self.store)
    }

    /// Renders, extracts and stores a single page
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - URL already visited; nothing was rendered or stored
    /// * `Ok(Some(record))` - Page stored and marked visited
    /// * `Err(ScrapeError)` - Fetch, render, extraction or persistence failed, or the crawl was cancelled
    pub async fn visit_page(&mut self, url: &str) -> Result<Option<PageRecord>, ScrapeError> {
        Ok(self.visit(url).await?.map(|(record, _)| record))
    }

    async fn visit(&mut self, url: &str) -> Result<Option<(PageRecord, PageProgress)>, ScrapeError> {
        let mut progress = PageProgress::new(url);

        if self.visited.contains(url) {
            progress.advance(PageState::Skipped)?;
            tracing::debug!("Already visited: {}", url);
            return Ok(None);
        }

        if self.cancel.is_cancelled() {
            return Err(ScrapeError::Cancelled);
        }

        progress.advance(PageState::Fetching)?;
        tracing::info!("Visiting {}", url);

        let markup = match cancellable(&self.cancel, self.render_with_retry(url)).await {
            Ok(markup) => markup,
            Err(e) => {
                progress.fail();
                return Err(e);
            }
        };

        let record = match extract_at(&markup, url, self.clock.next()) {
            Ok(record) => record,
            Err(e) => {
                progress.fail();
                return Err(e);
            }
        };
        progress.advance(PageState::Extracted)?;

        if self.cancel.is_cancelled() {
            progress.fail();
            return Err(ScrapeError::Cancelled);
        }

        let assigned = match self.persist(&record) {
            Ok(id) => id,
            Err(e) => {
                progress.fail();
                return Err(e);
            }
        };
        progress.advance(PageState::Persisted)?;

        self.visited.insert(url);
        tracing::info!(
            "Persisted {} ({} links, {} images, id {})",
            url,
            record.links().len(),
            record.images().len(),
            assigned
        );

        Ok(Some((record, progress)))
    }

    fn persist(&mut self, record: &PageRecord) -> Result<String, ScrapeError> {
        let url = record.url();
        match self.store.insert(record) {
            Ok(Some(id)) => Ok(id),
            Ok(None) => Err(ScrapeError::Persist {
                url: url.to_string(),
                reason: "store assigned no id".to_string(),
            }),
            Err(e) => Err(ScrapeError::Persist {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn render_with_retry(&self, url: &str) -> Result<String, ScrapeError> {
        let policy = self.options.retry;
        let mut attempt = 0;

        loop {
            match self.gateway.render(url).await {
                Ok(markup) => return Ok(markup),
                Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                    let delay = policy.delay_for(attempt);
                    attempt += 1;
                    tracing::warn!(
                        "{} (attempt {}/{}), retrying in {:?}",
                        e,
                        attempt,
                        policy.max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Crawls depth-first from a start URL
    ///
    /// Links are evaluated against the filter when they are reached, so a
    /// URL stored deeper in an earlier branch is skipped later on. A failure
    /// below the start URL is logged and only abandons that branch.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - Traversal finished or was cancelled
    /// * `Err(ScrapeError)` - The start URL failed, or a fatal error occurred
    pub async fn crawl(&mut self, seed: &str) -> Result<CrawlReport, ScrapeError> {
        let start_time = Instant::now();
        let mut report = CrawlReport::default();

        tracing::info!("Starting crawl at {}", seed);

        let (record, progress) = match self.visit(seed).await {
            Ok(Some(visited)) => visited,
            Ok(None) => {
                tracing::info!("{} was already visited, nothing to crawl", seed);
                report.already_visited += 1;
                return Ok(report);
            }
            Err(ScrapeError::Cancelled) => {
                tracing::info!("Crawl cancelled before {} was stored", seed);
                report.cancelled = true;
                return Ok(report);
            }
            Err(e) => {
                self.failed.insert(seed.to_string());
                return Err(e);
            }
        };
        report.pages_persisted += 1;

        let mut stack = vec![Frame::expand(record, progress)?];

        while let Some(frame) = stack.last_mut() {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                break;
            }

            let Some(link) = frame.next_link() else {
                if let Some(done) = stack.pop() {
                    done.finish()?;
                }
                continue;
            };

            if self.failed.contains(&link) {
                tracing::debug!("Skipping {} (failed earlier in this run)", link);
                report.links_filtered += 1;
                continue;
            }

            if !self.options.filter.is_eligible(&link, &self.visited) {
                tracing::debug!("Filtered {}", link);
                report.links_filtered += 1;
                continue;
            }

            match self.visit(&link).await {
                Ok(Some((record, progress))) => {
                    report.pages_persisted += 1;
                    if report.pages_persisted % PROGRESS_INTERVAL == 0 {
                        let rate =
                            report.pages_persisted as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {} pages persisted, depth {}, {:.2} pages/sec",
                            report.pages_persisted,
                            stack.len() + 1,
                            rate
                        );
                    }
                    stack.push(Frame::expand(record, progress)?);
                }
                Ok(None) => report.already_visited += 1,
                Err(ScrapeError::Cancelled) => {
                    report.cancelled = true;
                    break;
                }
                Err(e) if e.is_branch_local() => {
                    tracing::warn!("Abandoning branch at {}: {}", link, e);
                    self.failed.insert(link);
                    report.failed_branches += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "Crawl from {} finished in {:.1}s: {}",
            seed,
            start_time.elapsed().as_secs_f64(),
            report
        );

        Ok(report)
    }
}
