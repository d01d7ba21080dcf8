use crate::ConfigError;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Main configuration structure for Spindle
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default, rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default, rename = "action")]
    pub actions: Vec<Action>,
    #[serde(default, rename = "task")]
    pub tasks: Vec<Task>,
}

impl Config {
    /// Resolves the action names of a task against the configured actions
    pub fn actions_for(&self, task: &Task) -> Result<Vec<Arc<Action>>, ConfigError> {
        task.actions
            .iter()
            .map(|name| {
                self.actions
                    .iter()
                    .find(|a| &a.name == name)
                    .map(|a| Arc::new(a.clone()))
                    .ok_or_else(|| ConfigError::UnknownAction {
                        task: task.name.clone(),
                        action: name.clone(),
                    })
            })
            .collect()
    }

    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Simultaneous transfers allowed per action of a task
    #[serde(rename = "max-parallel-per-action", default = "default_parallel")]
    pub max_parallel_per_action: usize,

    /// Explicit cap on simultaneous transfers, overrides the per-action product
    #[serde(rename = "max-concurrent-transfers", default)]
    pub max_concurrent_transfers: Option<usize>,

    /// Upper bound of one wait for transfer completions (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Timeout of a single transfer (seconds)
    #[serde(rename = "transfer-timeout-secs", default = "default_transfer_timeout")]
    pub transfer_timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Overall timeout of one task's crawl (seconds)
    #[serde(rename = "crawl-timeout-secs", default)]
    pub crawl_timeout_secs: Option<u64>,
}

fn default_parallel() -> usize {
    5
}

fn default_poll_interval() -> u64 {
    1000
}

fn default_transfer_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_parallel_per_action: default_parallel(),
            max_concurrent_transfers: None,
            poll_interval_ms: default_poll_interval(),
            transfer_timeout_secs: default_transfer_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            crawl_timeout_secs: None,
        }
    }
}

impl CrawlerConfig {
    /// Number of transfers allowed in flight for a task with `action_count` actions
    ///
    /// Never below 1 nor above `Semaphore::MAX_PERMITS`.
    pub fn concurrency_cap(&self, action_count: usize) -> usize {
        self.max_concurrent_transfers
            .or_else(|| self.max_parallel_per_action.checked_mul(action_count.max(1)))
            .unwrap_or(Semaphore::MAX_PERMITS)
            .clamp(1, Semaphore::MAX_PERMITS)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name", default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version", default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url", default)]
    pub contact_url: Option<String>,
}

fn default_crawler_name() -> String {
    "spindle".to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn user_agent_string(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Directory receiving saved payloads
    #[serde(rename = "data-root", default = "default_data_root")]
    pub data_root: PathBuf,

    /// Path to the markdown summary file
    #[serde(rename = "summary-path", default)]
    pub summary_path: Option<PathBuf>,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_root: default_data_root(),
            summary_path: None,
        }
    }
}

/// One typed option of an action
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionOption {
    /// Hops from the seed whose links are still expanded
    MaxDepth(u32),
    /// Keep one copy of the payloads per run
    Versioning(bool),
    /// MIME-type substrings to keep; empty keeps everything
    #[serde(rename = "type")]
    TypeSelect(BTreeSet<String>),
}

/// A named crawl target: seed URL plus options
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Action {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub options: Vec<ActionOption>,
}

impl Action {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            options: Vec::new(),
        }
    }

    pub fn with_option(mut self, option: ActionOption) -> Self {
        self.options.push(option);
        self
    }

    /// Maximum expansion depth, 0 when unset (seed only)
    pub fn max_depth(&self) -> u32 {
        self.options
            .iter()
            .rev()
            .find_map(|opt| match opt {
                ActionOption::MaxDepth(depth) => Some(*depth),
                _ => None,
            })
            .unwrap_or(0)
    }

    pub fn versioning(&self) -> bool {
        self.options
            .iter()
            .rev()
            .find_map(|opt| match opt {
                ActionOption::Versioning(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Union of every type selection option
    pub fn selected_types(&self) -> BTreeSet<&str> {
        self.options
            .iter()
            .filter_map(|opt| match opt {
                ActionOption::TypeSelect(types) => Some(types),
                _ => None,
            })
            .flatten()
            .map(String::as_str)
            .collect()
    }

    /// Returns true if a payload of `content_type` should be kept
    ///
    /// A type is selected when no selection is configured, or when any selected
    /// entry occurs as a substring of the content type.
    pub fn is_selected(&self, content_type: &str) -> bool {
        let selected = self.selected_types();
        selected.is_empty() || selected.iter().any(|t| content_type.contains(*t))
    }
}

/// A named group of actions sharing a launch time
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub hour: i64,
    #[serde(default)]
    pub minute: i64,
    #[serde(default)]
    pub second: i64,
    /// Names of the actions, in execution order
    #[serde(default)]
    pub actions: Vec<String>,
}

impl Task {
    pub fn launch_time(&self) -> LaunchTime {
        LaunchTime::normalized(self.hour, self.minute, self.second)
    }
}

/// Hour/minute/second launch time of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchTime {
    pub hour: u64,
    pub minute: u64,
    pub second: u64,
}

impl LaunchTime {
    /// Clamps negative fields to 0 and carries overflowing seconds and minutes
    pub fn normalized(hour: i64, minute: i64, second: i64) -> Self {
        let mut hour = hour.max(0) as u64;
        let mut minute = minute.max(0) as u64;
        let mut second = second.max(0) as u64;

        if second > 60 {
            minute += second / 60;
            second %= 60;
        }
        if minute > 60 {
            hour += minute / 60;
            minute %= 60;
        }

        Self {
            hour,
            minute,
            second,
        }
    }
}

impl fmt::Display for LaunchTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m {}s", self.hour, self.minute, self.second)
    }
}
