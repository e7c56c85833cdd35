//! Harvest engine
//!
//! Fetches the dashboard, extracts feed links, and drains the feed queue
//! round-robin under one run-wide deadline.

pub mod controller;
pub mod deadline;
pub mod fetcher;
pub mod parser;
pub mod policy;
pub mod queue;

pub use controller::{
    run_harvest, Harvester, RunContext, RunOutcome, EXIT_DASHBOARD_TIMEOUT, EXIT_FEEDS_TIMEOUT,
    EXIT_SUCCESS, EXIT_TOO_FEW_FEEDS, EXIT_UNEXPECTED,
};
pub use deadline::{Deadline, DeadlineExhausted};
pub use fetcher::{build_http_client, fetch_dashboard, Attempt, Fetch, HttpFetcher, RetryReason};
pub use parser::extract_feed_links;
pub use policy::{pause_within, RetryPolicy, TimeoutRange};
pub use queue::{drain_queue, FeedItem, FetchQueue};
