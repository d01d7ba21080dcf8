use crate::config::types::{Action, Config, CrawlerConfig, Task};
use crate::ConfigError;
use std::collections::HashSet;
use tokio::sync::Semaphore;
use url::Url;

/// Longest accepted timeout of any kind (30 days)
pub const MAX_TIMEOUT_SECS: u64 = 30 * 24 * 60 * 60;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_actions(&config.actions)?;
    validate_tasks(&config.tasks, &config.actions)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_parallel_per_action < 1 {
        return Err(ConfigError::Validation(format!(
            "max_parallel_per_action must be >= 1, got {}",
            config.max_parallel_per_action
        )));
    }

    if config.max_parallel_per_action > Semaphore::MAX_PERMITS {
        return Err(ConfigError::Validation(format!(
            "max_parallel_per_action must be <= {}, got {}",
            Semaphore::MAX_PERMITS,
            config.max_parallel_per_action
        )));
    }

    match config.max_concurrent_transfers {
        Some(0) => {
            return Err(ConfigError::Validation(
                "max_concurrent_transfers must be >= 1".to_string(),
            ))
        }
        Some(cap) if cap > Semaphore::MAX_PERMITS => {
            return Err(ConfigError::Validation(format!(
                "max_concurrent_transfers must be <= {}, got {}",
                Semaphore::MAX_PERMITS,
                cap
            )))
        }
        _ => {}
    }

    if config.poll_interval_ms < 1 || config.poll_interval_ms > 1000 {
        return Err(ConfigError::Validation(format!(
            "poll_interval_ms must be between 1 and 1000, got {}",
            config.poll_interval_ms
        )));
    }

    if config.transfer_timeout_secs < 1 || config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "transfer and connect timeouts must be >= 1s".to_string(),
        ));
    }

    if config.transfer_timeout_secs > MAX_TIMEOUT_SECS
        || config.connect_timeout_secs > MAX_TIMEOUT_SECS
    {
        return Err(ConfigError::Validation(format!(
            "transfer and connect timeouts must be <= {}s",
            MAX_TIMEOUT_SECS
        )));
    }

    match config.crawl_timeout_secs {
        Some(0) => {
            return Err(ConfigError::Validation(
                "crawl_timeout_secs must be >= 1s".to_string(),
            ))
        }
        Some(secs) if secs > MAX_TIMEOUT_SECS => {
            return Err(ConfigError::Validation(format!(
                "crawl_timeout_secs must be <= {}s, got {}",
                MAX_TIMEOUT_SECS, secs
            )))
        }
        _ => {}
    }

    Ok(())
}

/// Validates action names and seed URLs
fn validate_actions(actions: &[Action]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for action in actions {
        if action.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "action name cannot be empty".to_string(),
            ));
        }

        if !seen.insert(action.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate action name '{}'",
                action.name
            )));
        }

        validate_seed_url(&action.url)?;
    }

    Ok(())
}

/// Validates a seed URL: must parse and use http or https
pub fn validate_seed_url(seed: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' must use http or https",
            seed
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "Seed URL '{}' has no host",
            seed
        )));
    }

    Ok(url)
}

/// Validates tasks and their references to actions
fn validate_tasks(tasks: &[Task], actions: &[Action]) -> Result<(), ConfigError> {
    for task in tasks {
        if task.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "task name cannot be empty".to_string(),
            ));
        }

        for name in &task.actions {
            if !actions.iter().any(|a| &a.name == name) {
                return Err(ConfigError::UnknownAction {
                    task: task.name.clone(),
                    action: name.clone(),
                });
            }
        }
    }

    Ok(())
}
