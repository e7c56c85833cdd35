use crate::config::types::{CollectorConfig, Config, RetryConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_collector_config(&config.collector)?;
    validate_retry_config(&config.retry)?;
    validate_user_agent_config(&config.user_agent)?;
    Ok(())
}

/// Validates collector configuration
fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.dashboard_url).map_err(|e| {
        ConfigError::InvalidUrl(format!(
            "Invalid dashboard_url '{}': {}",
            config.dashboard_url, e
        ))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "dashboard_url '{}' must use http or https",
            config.dashboard_url
        )));
    }

    if config.timeout == 0 {
        return Err(ConfigError::Validation(
            "timeout must be at least 1 second".to_string(),
        ));
    }

    if config.save_dir.is_empty() {
        return Err(ConfigError::Validation(
            "save_dir cannot be empty".to_string(),
        ));
    }

    if config.link_suffix.is_empty() {
        return Err(ConfigError::Validation(
            "link_suffix cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    validate_range(
        "dashboard timeout",
        config.dashboard_timeout_min,
        config.dashboard_timeout_max,
    )?;
    validate_range(
        "feed timeout",
        config.feed_timeout_min,
        config.feed_timeout_max,
    )?;
    Ok(())
}

fn validate_range(name: &str, min: u64, max: u64) -> Result<(), ConfigError> {
    if min == 0 {
        return Err(ConfigError::Validation(format!(
            "{} minimum must be >= 1s, got {}s",
            name, min
        )));
    }

    if min > max {
        return Err(ConfigError::Validation(format!(
            "{} range is empty: min {}s > max {}s",
            name, min, max
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}
