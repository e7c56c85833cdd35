//! Round-robin fetch queue
//!
//! Feeds are fetched in discovery order. A feed whose attempt fails in an
//! expected way goes to the back of the queue, so it is only retried after
//! every other pending feed has had a turn. Only the run deadline stops the
//! drain early.

use crate::harvester::deadline::Deadline;
use crate::harvester::fetcher::{Attempt, Fetch};
use crate::harvester::policy::{pause_within, RetryPolicy};
use crate::state::ItemState;
use crate::storage::{FetchRecord, Manifest, RunDirectory};
use crate::HarvestError;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::time::Instant;
use url::Url;

/// A feed discovered on the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedItem {
    /// The href exactly as it appeared on the page
    pub href: String,

    /// The href resolved against the dashboard URL
    pub url: Url,
}

impl FeedItem {
    pub fn new(href: &str, url: Url) -> Self {
        Self {
            href: href.to_string(),
            url,
        }
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

/// FIFO of pending feeds with per-feed lifecycle tracking
#[derive(Debug, Default)]
pub struct FetchQueue {
    pending: VecDeque<FeedItem>,
    states: HashMap<String, ItemState>,
    attempts: HashMap<String, u32>,
}

impl FetchQueue {
    /// Creates a queue holding `items` in order, all `Pending`
    pub fn new(items: Vec<FeedItem>) -> Self {
        let states = items
            .iter()
            .map(|item| (item.as_str().to_string(), ItemState::Pending))
            .collect();

        Self {
            pending: items.into(),
            states,
            attempts: HashMap::new(),
        }
    }

    /// Number of feeds waiting for a turn
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn state(&self, url: &str) -> Option<ItemState> {
        self.states.get(url).copied()
    }

    /// Attempts started for `url` so far
    pub fn attempts(&self, url: &str) -> u32 {
        self.attempts.get(url).copied().unwrap_or(0)
    }

    /// Takes the head of the queue and marks it `Fetching`
    pub fn next(&mut self) -> Result<Option<FeedItem>, HarvestError> {
        let Some(item) = self.pending.pop_front() else {
            return Ok(None);
        };
        self.transition(&item, ItemState::Fetching)?;
        *self.attempts.entry(item.as_str().to_string()).or_insert(0) += 1;
        Ok(Some(item))
    }

    /// Puts a failed feed back at the tail
    pub fn requeue(&mut self, item: FeedItem) -> Result<(), HarvestError> {
        self.transition(&item, ItemState::Pending)?;
        self.pending.push_back(item);
        Ok(())
    }

    /// Marks a feed as fetched; it never re-enters the queue
    pub fn complete(&mut self, item: &FeedItem) -> Result<(), HarvestError> {
        self.transition(item, ItemState::Fetched)
    }

    fn transition(&mut self, item: &FeedItem, to: ItemState) -> Result<(), HarvestError> {
        let state = self
            .states
            .entry(item.as_str().to_string())
            .or_insert(ItemState::Pending);

        if !state.can_transition_to(to) {
            return Err(HarvestError::InvalidTransition {
                url: item.as_str().to_string(),
                from: *state,
                to,
            });
        }

        *state = to;
        Ok(())
    }
}

/// Fetches every queued feed, recording each success in the run directory
///
/// For each turn:
/// 1. Ask the deadline for a random attempt timeout from `policy.feed`
/// 2. Pop the head and fetch it
/// 3. On success, store the body, persist the manifest, mark it fetched
/// 4. On an expected failure, requeue it at the tail and pause
///
/// # Returns
///
/// * `Ok(usize)` - Number of feeds fetched; the queue is empty
/// * `Err(HarvestError::Deadline)` - Budget ran out with feeds still pending;
///   everything fetched so far is already in the manifest
/// * `Err(_)` - Unexpected transport or storage fault
pub async fn drain_queue<F: Fetch>(
    queue: &mut FetchQueue,
    fetcher: &F,
    deadline: &Deadline,
    policy: &RetryPolicy,
    run_dir: &RunDirectory,
    manifest: &mut Manifest,
) -> Result<usize, HarvestError> {
    let mut fetched = 0;

    while !queue.is_empty() {
        let timeout = deadline.until(policy.feed.sample())?;
        let Some(item) = queue.next()? else {
            break;
        };

        tracing::debug!(
            "Fetching {} (attempt {}, timeout {:.1}s)",
            item.url,
            queue.attempts(item.as_str()),
            timeout.as_secs_f64()
        );

        let attempt_started = Instant::now();
        match fetcher.fetch(&item.url, timeout).await? {
            Attempt::Success(body) => {
                let record =
                    FetchRecord::new(item.as_str(), &body, Utc::now(), attempt_started.elapsed());
                run_dir.record_feed(manifest, record, &body)?;
                queue.complete(&item)?;
                fetched += 1;

                if fetched % 10 == 0 {
                    tracing::info!(
                        "Progress: {} feeds fetched, {} pending, {:.0}s left",
                        manifest.fetched_count(),
                        queue.len(),
                        deadline.remaining().as_secs_f64()
                    );
                }
            }
            Attempt::Retry(reason) => {
                tracing::warn!(
                    "Feed {} attempt {} failed: {}; requeued behind {} others",
                    item.url,
                    queue.attempts(item.as_str()),
                    reason,
                    queue.len()
                );
                queue.requeue(item)?;
                pause_within(deadline, policy.pause).await;
            }
        }
    }

    Ok(fetched)
}
