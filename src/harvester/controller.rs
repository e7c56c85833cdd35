//! Run controller - one bounded harvest from dashboard to manifest
//!
//! This module sequences a run:
//! - Fixing the run start time and deadline
//! - Fetching the dashboard and extracting feed links
//! - Creating the run directory and initial manifest
//! - Draining the feed queue
//! - Turning the terminal condition into a [`RunOutcome`]

use crate::config::Config;
use crate::harvester::deadline::Deadline;
use crate::harvester::fetcher::{fetch_dashboard, Fetch, HttpFetcher};
use crate::harvester::parser::extract_feed_links;
use crate::harvester::policy::RetryPolicy;
use crate::harvester::queue::{drain_queue, FetchQueue};
use crate::storage::{Manifest, RunDirectory};
use crate::HarvestError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use url::Url;

/// Everything a run needs, fixed when the run starts
#[derive(Debug, Clone)]
pub struct RunContext {
    pub dashboard_url: Url,
    pub timeout: Duration,
    pub min_feeds: usize,
    pub save_dir: PathBuf,
    pub link_suffix: String,
    pub policy: RetryPolicy,

    /// Wall-clock start, used for naming and the manifest
    pub started_at: DateTime<Utc>,

    /// Monotonic start, used for the deadline
    pub started: Instant,
}

impl RunContext {
    /// Builds the context and starts the clock
    pub fn from_config(config: &Config) -> Result<Self, HarvestError> {
        Ok(Self {
            dashboard_url: Url::parse(&config.collector.dashboard_url)?,
            timeout: config.collector.timeout(),
            min_feeds: config.collector.min_feeds,
            save_dir: PathBuf::from(&config.collector.save_dir),
            link_suffix: config.collector.link_suffix.clone(),
            policy: RetryPolicy::from_config(&config.retry),
            started_at: Utc::now(),
            started: Instant::now(),
        })
    }

    pub fn deadline(&self) -> Deadline {
        Deadline::new(self.started, self.timeout)
    }
}

/// Exit code for a completed harvest
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for unexpected faults
pub const EXIT_UNEXPECTED: u8 = 1;
/// Exit code when the dashboard could not be fetched in time
pub const EXIT_DASHBOARD_TIMEOUT: u8 = 3;
/// Exit code when some feeds were still pending at the deadline
pub const EXIT_FEEDS_TIMEOUT: u8 = 4;
/// Exit code when fewer feeds than expected were listed
pub const EXIT_TOO_FEW_FEEDS: u8 = 5;

/// How a run ended, short of an unexpected fault
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every discovered feed fetched and the count met the minimum
    Complete { run_dir: PathBuf, fetched: usize },

    /// The dashboard never answered 200 within the budget; no run
    /// directory was created
    DashboardTimeout { url: String, timeout: Duration },

    /// The budget ran out with feeds still pending
    FeedsTimeout {
        run_dir: PathBuf,
        fetched: usize,
        discovered: usize,
    },

    /// All feeds fetched, but fewer were listed than expected
    TooFewFeeds {
        run_dir: PathBuf,
        found: usize,
        minimum: usize,
    },
}

impl RunOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Complete { .. } => EXIT_SUCCESS,
            Self::DashboardTimeout { .. } => EXIT_DASHBOARD_TIMEOUT,
            Self::FeedsTimeout { .. } => EXIT_FEEDS_TIMEOUT,
            Self::TooFewFeeds { .. } => EXIT_TOO_FEW_FEEDS,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }

    /// Run directory, if one was created
    pub fn run_dir(&self) -> Option<&Path> {
        match self {
            Self::Complete { run_dir, .. }
            | Self::FeedsTimeout { run_dir, .. }
            | Self::TooFewFeeds { run_dir, .. } => Some(run_dir),
            Self::DashboardTimeout { .. } => None,
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete { run_dir, fetched } => {
                write!(f, "Fetched {} feeds into {}", fetched, run_dir.display())
            }
            Self::DashboardTimeout { url, timeout } => write!(
                f,
                "Failed fetching {} within timeout of {} seconds",
                url,
                timeout.as_secs()
            ),
            Self::FeedsTimeout {
                fetched,
                discovered,
                ..
            } => write!(
                f,
                "Could not fetch all feeds within the timeout limit. Fetched {} feeds out of {}.",
                fetched, discovered
            ),
            Self::TooFewFeeds { found, minimum, .. } => write!(
                f,
                "Found {} feeds, less than expected minimum of {}.",
                found, minimum
            ),
        }
    }
}

/// Runs one harvest with a given fetcher
pub struct Harvester<F: Fetch> {
    ctx: RunContext,
    fetcher: F,
}

impl<F: Fetch> Harvester<F> {
    pub fn new(ctx: RunContext, fetcher: F) -> Self {
        Self { ctx, fetcher }
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    /// Runs the harvest to one of its terminal conditions
    ///
    /// Deadline expiry is reported through [`RunOutcome`]; only unexpected
    /// faults come back as `Err`.
    pub async fn run(&self) -> Result<RunOutcome, HarvestError> {
        let ctx = &self.ctx;
        let deadline = ctx.deadline();

        tracing::info!(
            "Starting harvest of {} ({}s budget, minimum {} feeds)",
            ctx.dashboard_url,
            ctx.timeout.as_secs(),
            ctx.min_feeds
        );

        let page = match fetch_dashboard(&self.fetcher, &ctx.dashboard_url, &deadline, &ctx.policy)
            .await
        {
            Ok(page) => page,
            Err(e) if e.is_deadline() => {
                return Ok(RunOutcome::DashboardTimeout {
                    url: ctx.dashboard_url.to_string(),
                    timeout: ctx.timeout,
                });
            }
            Err(e) => return Err(e),
        };

        let items = extract_feed_links(&page, &ctx.dashboard_url, &ctx.link_suffix);
        let discovered = items.len();
        tracing::info!("Found {} feeds on the dashboard", discovered);

        let run_dir = RunDirectory::create(&ctx.save_dir, ctx.started_at)?;
        let mut manifest = Manifest::new(
            ctx.dashboard_url.as_str(),
            ctx.started_at,
            items.iter().map(|item| item.as_str().to_string()).collect(),
        );
        run_dir.persist(&manifest)?;

        let mut queue = FetchQueue::new(items);
        match drain_queue(
            &mut queue,
            &self.fetcher,
            &deadline,
            &ctx.policy,
            &run_dir,
            &mut manifest,
        )
        .await
        {
            Ok(fetched) => tracing::info!(
                "Fetched {} feeds in {:.1}s",
                fetched,
                deadline.elapsed().as_secs_f64()
            ),
            Err(e) if e.is_deadline() => {
                return Ok(RunOutcome::FeedsTimeout {
                    run_dir: run_dir.path().to_path_buf(),
                    fetched: manifest.fetched_count(),
                    discovered,
                });
            }
            Err(e) => return Err(e),
        }

        if discovered < ctx.min_feeds {
            return Ok(RunOutcome::TooFewFeeds {
                run_dir: run_dir.path().to_path_buf(),
                found: discovered,
                minimum: ctx.min_feeds,
            });
        }

        Ok(RunOutcome::Complete {
            run_dir: run_dir.path().to_path_buf(),
            fetched: manifest.fetched_count(),
        })
    }
}

/// Runs one harvest over HTTP
///
/// # Example
///
/// ```no_run
/// use status_harvester::config::Config;
/// use status_harvester::harvester::run_harvest;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let outcome = run_harvest(&Config::default()).await?;
/// std::process::exit(outcome.exit_code() as i32);
/// # }
/// ```
pub async fn run_harvest(config: &Config) -> Result<RunOutcome, HarvestError> {
    let ctx = RunContext::from_config(config)?;
    let fetcher = HttpFetcher::from_config(&config.user_agent)?;
    Harvester::new(ctx, fetcher).run().await
}
