//! Run manifest and per-feed fetch records
//!
//! The manifest is the run-wide summary written after every successful feed.
//! Its JSON form is the on-disk contract; field names are kept short and
//! stable so older runs stay readable.

use crate::storage::error::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::time::Duration;

/// Extension of stored feed files
pub const CONTENT_EXTENSION: &str = "rss.gz";

/// Result of one successful feed fetch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchRecord {
    /// Feed URL as queued
    pub url: String,

    /// Stored file name inside the run directory
    pub file: String,

    /// When the fetch completed
    pub fetched: DateTime<Utc>,

    /// Seconds spent on the successful attempt
    pub elapsed: f64,

    /// Size of the uncompressed body in bytes
    pub size: u64,
}

impl FetchRecord {
    /// Builds the record for a fetched body
    pub fn new(url: &str, body: &str, fetched: DateTime<Utc>, elapsed: Duration) -> Self {
        Self {
            url: url.to_string(),
            file: content_file_name(url, body),
            fetched,
            elapsed: elapsed.as_secs_f64(),
            size: body.len() as u64,
        }
    }
}

/// Content-addressed file name for a feed body
///
/// Derived from `sha256(url + ":" + body)`, so refetching identical content
/// for the same URL always lands on the same name.
pub fn content_file_name(url: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(url.as_bytes());
    hasher.update(b":");
    hasher.update(body.as_bytes());
    format!("{}.{}", hex::encode(hasher.finalize()), CONTENT_EXTENSION)
}

/// Run-wide summary of discovered and fetched feeds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Every feed URL found on the dashboard, in discovery order
    #[serde(rename = "rss_urls")]
    pub feed_urls: Vec<String>,

    /// Run start time
    pub started: DateTime<Utc>,

    /// Dashboard the feeds were discovered on
    pub dashboard_url: String,

    /// Fetched feeds keyed by URL
    pub url_info: BTreeMap<String, FetchRecord>,
}

impl Manifest {
    /// Creates a manifest with no fetched feeds yet
    pub fn new(dashboard_url: &str, started: DateTime<Utc>, feed_urls: Vec<String>) -> Self {
        Self {
            feed_urls,
            started,
            dashboard_url: dashboard_url.to_string(),
            url_info: BTreeMap::new(),
        }
    }

    /// Adds a fetch record
    ///
    /// Records are never replaced; a second record for the same URL is an
    /// error.
    pub fn record(&mut self, record: FetchRecord) -> StorageResult<()> {
        if self.url_info.contains_key(&record.url) {
            return Err(StorageError::DuplicateRecord(record.url));
        }
        self.url_info.insert(record.url.clone(), record);
        Ok(())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.url_info.contains_key(url)
    }

    pub fn get(&self, url: &str) -> Option<&FetchRecord> {
        self.url_info.get(url)
    }

    /// Number of feeds fetched so far
    pub fn fetched_count(&self) -> usize {
        self.url_info.len()
    }

    /// Number of feeds found on the dashboard
    pub fn discovered_count(&self) -> usize {
        self.feed_urls.len()
    }

    /// Discovered feeds without a fetch record, in discovery order
    pub fn missing(&self) -> Vec<&str> {
        self.feed_urls
            .iter()
            .filter(|url| !self.url_info.contains_key(url.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Serializes to pretty-printed JSON
    pub fn to_bytes(&self) -> StorageResult<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Parses the JSON form produced by [`Manifest::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> StorageResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
