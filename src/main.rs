//! Status-Harvester main entry point
//!
//! This is the command-line interface for the Status-Harvester feed collector.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use status_harvester::config::{load_config_with_hash, validate, Config};
use status_harvester::harvester::{run_harvest, RunOutcome, EXIT_UNEXPECTED};
use tracing_subscriber::EnvFilter;

/// Status-Harvester: a bounded-time status feed collector
///
/// Fetches a status dashboard, downloads every feed it links to within one
/// wall-clock budget, and stores the feeds plus a manifest in a timestamped
/// run directory. Exit codes: 0 success, 1 unexpected error, 3 dashboard
/// timeout, 4 feeds timeout, 5 fewer feeds than expected.
#[derive(Parser, Debug)]
#[command(name = "status-harvester")]
#[command(version)]
#[command(about = "A bounded-time status feed collector", long_about = None)]
struct Cli {
    /// Dashboard page listing the feeds
    #[arg(short, long, value_name = "URL")]
    dashboard_url: Option<String>,

    /// Run-wide timeout in seconds
    #[arg(short, long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Minimum number of feeds expected on the dashboard
    #[arg(short, long, value_name = "COUNT")]
    min_feeds: Option<usize>,

    /// Base directory for run directories
    #[arg(short, long, value_name = "DIRECTORY")]
    save_dir: Option<PathBuf>,

    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress everything but errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Summarize an existing run directory and exit
    #[arg(long, value_name = "RUN_DIR")]
    inspect: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("Harvest failed: {:#}", e);
            eprintln!("ERROR: {:?}", e);
            ExitCode::from(EXIT_UNEXPECTED)
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr; stdout is reserved for `--inspect` output.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("status_harvester=warn,warn"),
            1 => EnvFilter::new("status_harvester=info,warn"),
            2 => EnvFilter::new("status_harvester=debug,info"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Dispatches to the selected mode and returns the exit code
async fn run(cli: Cli) -> anyhow::Result<u8> {
    if let Some(run_dir) = &cli.inspect {
        handle_inspect(run_dir)?;
        return Ok(0);
    }

    let config = resolve_config(&cli)?;
    handle_harvest(&config).await
}

/// Builds the effective configuration: defaults, then file, then flags
fn resolve_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("loading configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(url) = &cli.dashboard_url {
        config.collector.dashboard_url = url.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.collector.timeout = timeout;
    }
    if let Some(min_feeds) = cli.min_feeds {
        config.collector.min_feeds = min_feeds;
    }
    if let Some(save_dir) = &cli.save_dir {
        config.collector.save_dir = save_dir.display().to_string();
    }

    validate(&config).context("invalid command-line options")?;
    Ok(config)
}

/// Handles the --inspect mode: prints the summary of a stored run
fn handle_inspect(run_dir: &Path) -> anyhow::Result<()> {
    use status_harvester::output::{load_summary, print_summary};

    let summary = load_summary(run_dir)
        .with_context(|| format!("reading run manifest in {}", run_dir.display()))?;
    print_summary(run_dir, &summary);
    Ok(())
}

/// Handles the main harvest and maps its outcome to an exit code
async fn handle_harvest(config: &Config) -> anyhow::Result<u8> {
    tracing::info!(
        "Harvesting {} into {}",
        config.collector.dashboard_url,
        config.collector.save_dir
    );

    let outcome = run_harvest(config)
        .await
        .with_context(|| format!("harvesting {}", config.collector.dashboard_url))?;

    report(&outcome);
    Ok(outcome.exit_code())
}

/// Prints the single diagnostic line for a failed outcome
fn report(outcome: &RunOutcome) {
    if outcome.is_success() {
        tracing::info!("{}", outcome);
        return;
    }

    if let Some(run_dir) = outcome.run_dir() {
        tracing::info!("Partial results kept in {}", run_dir.display());
    }
    eprintln!("ERROR: {}", outcome);
}
