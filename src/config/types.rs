use serde::Deserialize;
use std::time::Duration;

/// Default dashboard listing the status feeds
pub const DEFAULT_DASHBOARD_URL: &str = "http://status.aws.amazon.com/";

/// Main configuration structure for Status-Harvester
///
/// Every section is optional in the TOML file; missing values fall back to
/// the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
}

/// What to collect and where to put it
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Dashboard page listing the feed links
    #[serde(rename = "dashboard-url")]
    pub dashboard_url: String,

    /// Run-wide timeout in seconds
    pub timeout: u64,

    /// Minimum number of feeds expected on the dashboard
    #[serde(rename = "min-feeds")]
    pub min_feeds: usize,

    /// Base directory for run directories
    #[serde(rename = "save-dir")]
    pub save_dir: String,

    /// Only hrefs ending with this suffix are treated as feeds
    #[serde(rename = "link-suffix")]
    pub link_suffix: String,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            dashboard_url: DEFAULT_DASHBOARD_URL.to_string(),
            timeout: 3600,
            min_feeds: 150,
            save_dir: "saved".to_string(),
            link_suffix: ".rss".to_string(),
        }
    }
}

impl CollectorConfig {
    /// Run-wide budget as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Per-attempt timeout ranges and retry pacing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Lower bound of the dashboard attempt timeout (seconds)
    #[serde(rename = "dashboard-timeout-min")]
    pub dashboard_timeout_min: u64,

    /// Upper bound of the dashboard attempt timeout (seconds)
    #[serde(rename = "dashboard-timeout-max")]
    pub dashboard_timeout_max: u64,

    /// Lower bound of the feed attempt timeout (seconds)
    #[serde(rename = "feed-timeout-min")]
    pub feed_timeout_min: u64,

    /// Upper bound of the feed attempt timeout (seconds)
    #[serde(rename = "feed-timeout-max")]
    pub feed_timeout_max: u64,

    /// Pause after an expected failure before the next attempt (milliseconds)
    #[serde(rename = "pause-ms")]
    pub pause_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            dashboard_timeout_min: 60,
            dashboard_timeout_max: 300,
            feed_timeout_min: 10,
            feed_timeout_max: 60,
            pause_ms: 500,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the collector
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the collector
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the collector
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for collector-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "status-harvester".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/status-harvester/status-harvester".to_string(),
            contact_email: "ops@example.com".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Format: Name/Version (+ContactURL; ContactEmail)
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}
