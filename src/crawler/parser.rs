//! Page extractor
//!
//! Turns rendered markup into a [`PageRecord`]:
//! - Title from the first `<title>` element
//! - Whitespace-normalized body text
//! - Outbound links and image references, resolved against the page URL
//! - Declared document language

use crate::storage::{PageRecord, UNKNOWN_LANGUAGE};
use crate::url::{parse_base_url, resolve_reference};
use crate::ScrapeError;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use url::Url;
use uuid::Uuid;

lazy_static! {
    static ref NEWLINE_RUNS: Regex = Regex::new(r"\n+").unwrap();
    static ref BLANK_RUNS: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref TITLE_SELECTOR: Selector = Selector::parse("title").unwrap();
    static ref BODY_SELECTOR: Selector = Selector::parse("body").unwrap();
    static ref ANCHOR_SELECTOR: Selector = Selector::parse("a[href]").unwrap();
    static ref IMAGE_SELECTOR: Selector = Selector::parse("img[src]").unwrap();
}

/// Extracts a page record from rendered markup, stamped with the current time
///
/// # Arguments
///
/// * `markup` - The full rendered document
/// * `base_url` - The URL the document was fetched from
///
/// # Returns
///
/// * `Ok(PageRecord)` - Successfully extracted page
/// * `Err(ScrapeError::Parse)` - Markup is empty or the base URL is not absolute http(s)
///
/// # Example
///
/// ```
/// use sumi_scrape::crawler::extract;
///
/// let html = r#"<html lang="en"><head><title>Test</title></head>
///     <body><a href="/page">Link</a><img src="logo.png"></body></html>"#;
/// let page = extract(html, "https://example.com/").unwrap();
/// assert_eq!(page.title(), "Test");
/// assert_eq!(page.links(), ["https://example.com/page"]);
/// assert_eq!(page.images(), ["https://example.com/logo.png"]);
/// assert_eq!(page.language(), "en");
/// ```
pub fn extract(markup: &str, base_url: &str) -> Result<PageRecord, ScrapeError> {
    extract_at(markup, base_url, Utc::now())
}

/// Extracts a page record with an explicit capture time
pub fn extract_at(
    markup: &str,
    base_url: &str,
    fetched_at: DateTime<Utc>,
) -> Result<PageRecord, ScrapeError> {
    let base = parse_base_url(base_url).map_err(|e| ScrapeError::Parse {
        url: base_url.to_string(),
        message: e.to_string(),
    })?;

    if markup.trim().is_empty() {
        return Err(ScrapeError::Parse {
            url: base_url.to_string(),
            message: "document is empty".to_string(),
        });
    }

    let document = Html::parse_document(markup);

    Ok(PageRecord {
        id: Uuid::new_v4().to_string(),
        url: base_url.to_string(),
        fetched_at,
        title: extract_title(&document),
        raw_markup: markup.to_string(),
        text_content: extract_text(&document),
        links: extract_links(&document, &base),
        images: extract_images(&document, &base),
        language: extract_language(&document),
    })
}

/// Collapses newline runs, then space/tab runs, after trimming
pub fn normalize_text(text: &str) -> String {
    let text = NEWLINE_RUNS.replace_all(text.trim(), "\n");
    BLANK_RUNS.replace_all(&text, " ").into_owned()
}

fn extract_title(document: &Html) -> String {
    document
        .select(&TITLE_SELECTOR)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_text(document: &Html) -> String {
    let body: String = document
        .select(&BODY_SELECTOR)
        .flat_map(|element| element.text())
        .collect();

    normalize_text(&body)
}

/// Resolves every anchor href
///
/// Fragment-only hrefs and hrefs carrying a fragment are skipped. An empty
/// trailing `#` is dropped so `/page#` stays the same URL as `/page`.
fn extract_links(document: &Html, base: &Url) -> Vec<String> {
    document
        .select(&ANCHOR_SELECTOR)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| !href.trim_start().starts_with('#'))
        .filter_map(|href| resolve_reference(base, href))
        .filter(|url| url.fragment().map_or(true, str::is_empty))
        .map(|mut url| {
            url.set_fragment(None);
            String::from(url)
        })
        .collect()
}

fn extract_images(document: &Html, base: &Url) -> Vec<String> {
    document
        .select(&IMAGE_SELECTOR)
        .filter_map(|element| element.value().attr("src"))
        .filter_map(|src| resolve_reference(base, src))
        .map(String::from)
        .collect()
}

fn extract_language(document: &Html) -> String {
    document
        .root_element()
        .value()
        .attr("lang")
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .unwrap_or(UNKNOWN_LANGUAGE)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const BASE: &str = "https://example.com/blog/post";

    #[test]
    fn test_extract_title() {
        let html = "<html><head><title>  Hello World \n</title></head><body></body></html>";
        let page = extract(html, BASE).unwrap();
        assert_eq!(page.title(), "Hello World");
    }

    #[test]
    fn test_first_title_wins() {
        let html = "<html><head><title>First</title></head><body><svg><title>Second</title></svg></body></html>";
        let page = extract(html, BASE).unwrap();
        assert_eq!(page.title(), "First");
    }

    #[test]
    fn test_missing_title_is_empty() {
        let page = extract("<html><body><p>no title</p></body></html>", BASE).unwrap();
        assert_eq!(page.title(), "");
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("a\n\n\nb"), "a\nb");
        assert_eq!(normalize_text("a   b"), "a b");
        assert_eq!(normalize_text("a \t b"), "a b");
        assert_eq!(normalize_text("  \n a \n\n b \n "), "a \n b");
    }

    #[test]
    fn test_text_content_is_body_only() {
        let html = "<html><head><title>Title</title></head><body><h1>Head</h1>\n\n\n<p>Para   one</p></body></html>";
        let page = extract(html, BASE).unwrap();
        assert_eq!(page.text_content(), "Head\nPara one");
    }

    #[test]
    fn test_links_resolve_against_base() {
        let html = r#"<html><body>
            <a href="/root">Root</a>
            <a href="sibling">Sibling</a>
            <a href="https://other.org/x">Other</a>
        </body></html>"#;
        let page = extract(html, BASE).unwrap();
        assert_eq!(
            page.links(),
            [
                "https://example.com/root",
                "https://example.com/blog/sibling",
                "https://other.org/x",
            ]
        );
    }

    #[test]
    fn test_fragment_links_are_skipped() {
        let html = r##"<html><body>
            <a href="/a">A</a>
            <a href="#top">Top</a>
            <a href="/b#section">B section</a>
            <a href="/c">C</a>
        </body></html>"##;
        let page = extract(html, BASE).unwrap();
        assert_eq!(
            page.links(),
            ["https://example.com/a", "https://example.com/c"]
        );
    }

    #[test]
    fn test_empty_fragments_never_produce_new_urls() {
        let html = r##"<html><body>
            <a href="#">Top</a>
            <a href=" #">Top again</a>
            <a href="/page#">Page</a>
            <a href="/page">Page again</a>
        </body></html>"##;
        let page = extract(html, "https://example.com/").unwrap();
        assert_eq!(
            page.links(),
            ["https://example.com/page", "https://example.com/page"]
        );
    }

    #[test]
    fn test_blank_and_unresolvable_hrefs_are_skipped() {
        let html = r#"<html><body>
            <a href="">Empty</a>
            <a href="   ">Blank</a>
            <a>No href</a>
            <a href="http://[::1">Broken</a>
            <a href="/ok">Ok</a>
        </body></html>"#;
        let page = extract(html, BASE).unwrap();
        assert_eq!(page.links(), ["https://example.com/ok"]);
    }

    #[test]
    fn test_duplicate_links_are_kept() {
        let html = r#"<html><body><a href="/x">1</a><a href="/x">2</a></body></html>"#;
        let page = extract(html, BASE).unwrap();
        assert_eq!(page.links().len(), 2);
    }

    #[test]
    fn test_pseudo_scheme_links_are_kept_for_the_filter() {
        let html = r#"<html><body><a href="mailto:me@example.com">Mail</a></body></html>"#;
        let page = extract(html, BASE).unwrap();
        assert_eq!(page.links(), ["mailto:me@example.com"]);
    }

    #[test]
    fn test_images_resolve_against_base() {
        let html = r#"<html><body>
            <img src="logo.png">
            <img src="/static/banner.jpg">
            <img src="">
            <img alt="no source">
        </body></html>"#;
        let page = extract(html, "https://example.com/").unwrap();
        assert_eq!(
            page.images(),
            [
                "https://example.com/logo.png",
                "https://example.com/static/banner.jpg",
            ]
        );
    }

    #[test]
    fn test_language() {
        let page = extract(r#"<html lang=" de-DE "><body></body></html>"#, BASE).unwrap();
        assert_eq!(page.language(), "de-DE");

        let page = extract("<html><body></body></html>", BASE).unwrap();
        assert_eq!(page.language(), UNKNOWN_LANGUAGE);

        let page = extract(r#"<html lang="  "><body></body></html>"#, BASE).unwrap();
        assert_eq!(page.language(), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn test_record_fields() {
        let at = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let html = "<html><body>x</body></html>";
        let page = extract_at(html, BASE, at).unwrap();

        assert_eq!(page.url(), BASE);
        assert_eq!(page.fetched_at(), at);
        assert_eq!(page.raw_markup(), html);
        assert!(Uuid::parse_str(page.id()).is_ok());
    }

    #[test]
    fn test_each_record_gets_a_fresh_id() {
        let html = "<html><body>x</body></html>";
        let first = extract(html, BASE).unwrap();
        let second = extract(html, BASE).unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[test]
    fn test_empty_markup_is_parse_error() {
        let result = extract(" \n\t ", BASE);
        assert!(matches!(result, Err(ScrapeError::Parse { .. })));
    }

    #[test]
    fn test_invalid_base_is_parse_error() {
        let html = "<html><body>x</body></html>";
        assert!(matches!(
            extract(html, "/relative"),
            Err(ScrapeError::Parse { .. })
        ));
        assert!(matches!(
            extract(html, "ftp://example.com/"),
            Err(ScrapeError::Parse { .. })
        ));
    }

    #[test]
    fn test_malformed_markup_still_extracts() {
        let html = "<html><body><p>Unclosed <a href='/x'>link<div></body>";
        let page = extract(html, "https://example.com/").unwrap();
        assert_eq!(page.links(), ["https://example.com/x"]);
    }
}
