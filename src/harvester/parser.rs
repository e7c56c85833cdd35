//! Feed link extraction from the dashboard page
//!
//! Any element with an `href` whose raw value ends with the feed suffix is a
//! candidate. Candidates are resolved against the dashboard URL and kept in
//! document order, first occurrence wins.

use crate::harvester::queue::FeedItem;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts feed links from dashboard HTML
///
/// # Arguments
///
/// * `html` - The dashboard page content
/// * `base_url` - The dashboard URL, used to resolve relative hrefs
/// * `suffix` - Only hrefs ending with this (e.g. `.rss`) are kept
///
/// # Example
///
/// ```
/// use status_harvester::harvester::extract_feed_links;
/// use url::Url;
///
/// let html = r#"<a href="/rss/ec2.rss">EC2</a><a href="/about">About</a>"#;
/// let base = Url::parse("http://status.example.com/").unwrap();
/// let feeds = extract_feed_links(html, &base, ".rss");
/// assert_eq!(feeds.len(), 1);
/// assert_eq!(feeds[0].url.as_str(), "http://status.example.com/rss/ec2.rss");
/// ```
pub fn extract_feed_links(html: &str, base_url: &Url, suffix: &str) -> Vec<FeedItem> {
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut feeds = Vec::new();

    let Ok(selector) = Selector::parse("[href]") else {
        return feeds;
    };

    for element in document.select(&selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let href = href.trim();
        if !href.ends_with(suffix) {
            continue;
        }

        match resolve_link(href, base_url) {
            Some(url) => {
                if seen.insert(url.as_str().to_string()) {
                    feeds.push(FeedItem::new(href, url));
                }
            }
            None => tracing::debug!("Skipping unresolvable feed link {:?}", href),
        }
    }

    feeds
}

/// Resolves an href to an absolute http(s) URL
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let absolute_url = base_url.join(href).ok()?;
    match absolute_url.scheme() {
        "http" | "https" => Some(absolute_url),
        _ => None,
    }
}
