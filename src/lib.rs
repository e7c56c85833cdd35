//! Status-Harvester: a bounded-time status feed collector
//!
//! This crate fetches a public status dashboard, discovers the feed links it
//! lists, downloads every feed in round-robin order within one wall-clock
//! budget, and records the results in a timestamped run directory.

pub mod config;
pub mod harvester;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Status-Harvester operations
///
/// Expected transient failures (request timeouts, non-200 responses) never
/// show up here; they are retried where they happen. Everything in this enum
/// is either the run-wide deadline running out or an unexpected fault.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Deadline(#[from] harvester::DeadlineExhausted),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Invalid state transition for {url}: {from:?} -> {to:?}")]
    InvalidTransition {
        url: String,
        from: state::ItemState,
        to: state::ItemState,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Returns true if this error is the run-wide deadline running out
    pub fn is_deadline(&self) -> bool {
        matches!(self, Self::Deadline(_))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Status-Harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use harvester::{run_harvest, RunOutcome};
pub use state::ItemState;
pub use storage::{FetchRecord, Manifest};
