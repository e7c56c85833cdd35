//! Run summary built from a stored manifest
//!
//! This module provides functionality for inspecting a finished (or
//! interrupted) run directory and displaying what it holds.

use crate::storage::{load_manifest, FetchRecord, Manifest, StorageResult};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Summary of one run directory
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Run start time
    pub started: DateTime<Utc>,

    /// Dashboard the feeds came from
    pub dashboard_url: String,

    /// Number of feeds listed on the dashboard
    pub discovered: usize,

    /// Number of feeds with a stored body
    pub fetched: usize,

    /// Listed feeds that were never fetched, in discovery order
    pub missing: Vec<String>,

    /// Sum of uncompressed body sizes
    pub total_bytes: u64,

    /// Mean seconds per successful fetch
    pub mean_elapsed: Option<f64>,

    /// Slowest successful fetch as (url, seconds)
    pub slowest: Option<(String, f64)>,

    /// Time of the most recent successful fetch
    pub last_fetched: Option<DateTime<Utc>>,
}

impl RunSummary {
    /// True when every listed feed was fetched
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Builds a summary from a manifest
pub fn summarize(manifest: &Manifest) -> RunSummary {
    let records: Vec<&FetchRecord> = manifest.url_info.values().collect();

    let total_bytes = records.iter().map(|r| r.size).sum();
    let mean_elapsed = if records.is_empty() {
        None
    } else {
        Some(records.iter().map(|r| r.elapsed).sum::<f64>() / records.len() as f64)
    };
    let slowest = records
        .iter()
        .max_by(|a, b| a.elapsed.total_cmp(&b.elapsed))
        .map(|r| (r.url.clone(), r.elapsed));
    let last_fetched = records.iter().map(|r| r.fetched).max();

    RunSummary {
        started: manifest.started,
        dashboard_url: manifest.dashboard_url.clone(),
        discovered: manifest.discovered_count(),
        fetched: manifest.fetched_count(),
        missing: manifest.missing().into_iter().map(str::to_string).collect(),
        total_bytes,
        mean_elapsed,
        slowest,
        last_fetched,
    }
}

/// Loads the manifest of a run directory and summarizes it
pub fn load_summary(run_dir: &Path) -> StorageResult<RunSummary> {
    Ok(summarize(&load_manifest(run_dir)?))
}

/// Prints a summary to stdout in a formatted manner
pub fn print_summary(run_dir: &Path, summary: &RunSummary) {
    println!("=== Run Summary ===\n");

    println!("Run:");
    println!("  Directory: {}", run_dir.display());
    println!("  Started: {}", summary.started.to_rfc3339());
    println!("  Dashboard: {}", summary.dashboard_url);
    if let Some(last) = summary.last_fetched {
        let span = last - summary.started;
        println!(
            "  Last fetch: {} ({:.1}s after start)",
            last.to_rfc3339(),
            span.num_milliseconds() as f64 / 1000.0
        );
    }
    println!();

    let percentage = if summary.discovered > 0 {
        (summary.fetched as f64 / summary.discovered as f64) * 100.0
    } else {
        100.0
    };
    println!("Feeds:");
    println!("  Discovered: {}", summary.discovered);
    println!("  Fetched: {} ({:.1}%)", summary.fetched, percentage);
    println!("  Total size: {} bytes", summary.total_bytes);
    if let Some(mean) = summary.mean_elapsed {
        println!("  Mean fetch time: {:.2}s", mean);
    }
    if let Some((url, secs)) = &summary.slowest {
        println!("  Slowest fetch: {:.2}s ({})", secs, url);
    }
    println!();

    if !summary.missing.is_empty() {
        println!("Missing Feeds ({}):", summary.missing.len());
        for url in &summary.missing {
            println!("  - {}", url);
        }
        println!();
    }

    if summary.is_complete() {
        println!("✓ All discovered feeds fetched");
    } else {
        println!(
            "✗ {} of {} feeds missing",
            summary.missing.len(),
            summary.discovered
        );
    }
}
