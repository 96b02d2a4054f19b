//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! render, extract, persist and descend cycle against a file-backed store.

use sumi_scrape::config::{Config, FetchConfig};
use sumi_scrape::crawler::{Coordinator, CrawlOptions, StaticGateway};
use sumi_scrape::storage::{PageStore, SqlitePageStore};
use sumi_scrape::url::UrlFilter;
use sumi_scrape::ScrapeError;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Options for crawling a mock server, whose URLs always carry a port
fn local_options() -> CrawlOptions {
    let mut config = Config::default();
    config.filter.allow_explicit_ports = true;
    CrawlOptions::from_config(&config)
}

fn open_store(dir: &TempDir, namespace: &str) -> SqlitePageStore {
    let db_path = dir.path().join("pages.db");
    SqlitePageStore::open(db_path.to_str().unwrap(), namespace).unwrap()
}

fn gateway() -> StaticGateway {
    StaticGateway::new(&FetchConfig::default()).unwrap()
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

/// Mounts a small site: home -> about -> (home, contact 404)
async fn mount_site(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r##"<html lang="en"><head><title>Home</title></head><body>
                <h1>Welcome</h1>
                <a href="/about">About</a>
                <a href="/#section">Section</a>
                <a href="mailto:team@example.com">Mail</a>
                <img src="logo.png">
            </body></html>"##
                .to_string(),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(
            r#"<html><head><title>About</title></head><body>
                <p>About   us</p>
                <a href="/">Home</a>
                <a href="/contact">Contact</a>
            </body></html>"#
                .to_string(),
        ))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|requests| requests.len())
        .unwrap_or(0)
}

#[tokio::test]
async fn test_full_crawl_single_site() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let base = server.uri();

    let dir = TempDir::new().unwrap();
    let mut coordinator =
        Coordinator::new(gateway(), open_store(&dir, "web_scraper"), local_options()).unwrap();

    let report = coordinator.crawl(&format!("{}/", base)).await.unwrap();

    assert_eq!(report.pages_persisted, 2);
    assert_eq!(report.failed_branches, 1);
    assert!(!report.cancelled);

    let store = coordinator.store();
    assert_eq!(
        store.find_all_urls().unwrap(),
        vec![format!("{}/", base), format!("{}/about", base)]
    );

    let home = store
        .get_page_by_url(&format!("{}/", base))
        .unwrap()
        .expect("home page should be stored");
    assert_eq!(home.title(), "Home");
    assert_eq!(home.language(), "en");
    assert_eq!(
        home.links(),
        [format!("{}/about", base), "mailto:team@example.com".to_string()]
    );
    assert_eq!(home.images(), [format!("{}/logo.png", base)]);

    let about = store
        .get_page_by_url(&format!("{}/about", base))
        .unwrap()
        .expect("about page should be stored");
    assert_eq!(about.language(), "unknown");
    assert!(about.text_content().contains("About us"));
    assert!(about.fetched_at() >= home.fetched_at());
}

#[tokio::test]
async fn test_default_filter_stops_at_explicit_ports() {
    let server = MockServer::start().await;
    mount_site(&server).await;

    let dir = TempDir::new().unwrap();
    let options = CrawlOptions {
        filter: UrlFilter::default(),
        ..local_options()
    };
    let mut coordinator =
        Coordinator::new(gateway(), open_store(&dir, "web_scraper"), options).unwrap();

    let report = coordinator
        .crawl(&format!("{}/", server.uri()))
        .await
        .unwrap();

    assert_eq!(report.pages_persisted, 1);
    assert_eq!(report.links_filtered, 2);
    assert_eq!(request_count(&server).await, 1);
}

#[tokio::test]
async fn test_seed_error_status_is_returned() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut coordinator =
        Coordinator::new(gateway(), open_store(&dir, "web_scraper"), local_options()).unwrap();

    let result = coordinator.crawl(&format!("{}/", server.uri())).await;

    assert!(matches!(result, Err(ScrapeError::Fetch { .. })));
    assert_eq!(coordinator.store().count_pages().unwrap(), 0);
}

#[tokio::test]
async fn test_restart_skips_stored_pages() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let seed = format!("{}/", server.uri());

    let dir = TempDir::new().unwrap();
    {
        let mut first =
            Coordinator::new(gateway(), open_store(&dir, "web_scraper"), local_options())
                .unwrap();
        first.crawl(&seed).await.unwrap();
    }
    let requests_after_first = request_count(&server).await;

    let mut second =
        Coordinator::new(gateway(), open_store(&dir, "web_scraper"), local_options()).unwrap();
    assert!(second.visited().contains(&seed));

    let report = second.crawl(&seed).await.unwrap();

    assert_eq!(report.pages_persisted, 0);
    assert_eq!(report.already_visited, 1);
    assert_eq!(request_count(&server).await, requests_after_first);
    assert_eq!(second.store().count_pages().unwrap(), 2);
}

#[tokio::test]
async fn test_namespaces_crawl_independently() {
    let server = MockServer::start().await;
    mount_site(&server).await;
    let seed = format!("{}/", server.uri());

    let dir = TempDir::new().unwrap();
    let mut first =
        Coordinator::new(gateway(), open_store(&dir, "first"), local_options()).unwrap();
    first.crawl(&seed).await.unwrap();

    let mut second =
        Coordinator::new(gateway(), open_store(&dir, "second"), local_options()).unwrap();
    assert!(second.visited().is_empty());

    let report = second.crawl(&seed).await.unwrap();
    assert_eq!(report.pages_persisted, 2);
}
