//! Crawler module for page rendering and traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and status probing
//! - Rendering through a headless browser or plain HTTP
//! - Page extraction (title, text, links, images, language)
//! - Depth-first crawl coordination

mod coordinator;
mod fetcher;
mod parser;
mod render;

pub use coordinator::{Coordinator, CrawlOptions, CrawlReport, RetryPolicy};
pub use fetcher::{build_http_client, fetch_document, probe_status};
pub use parser::{extract, extract_at, normalize_text};
pub use render::{browser_capabilities, BrowserGateway, RenderGateway, StaticGateway};
