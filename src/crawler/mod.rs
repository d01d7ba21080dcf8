//! Crawler module for fetching and following links
//!
//! This module contains the crawling logic, including:
//! - HTTP transport and streaming payload writes
//! - The pending queue and concurrency cap
//! - The per-task transfer orchestrator
//! - Sequential task execution

mod fetcher;
mod orchestrator;
mod runner;
mod scheduler;

pub use fetcher::{build_http_client, fetch_url, is_html, FetchResult, PersistPlan};
pub use orchestrator::{Orchestrator, Session, SessionId};
pub use runner::TaskRunner;
pub use scheduler::{QueuedTransfer, ScheduledTransfer, Scheduler};

use crate::config::Config;
use crate::mime::MimeRegistry;
use crate::output::TaskReport;
use crate::Result;
use std::sync::Arc;

/// Runs the tasks of a configuration
///
/// This is the main entry point for a crawl. It will:
/// 1. Build the HTTP client
/// 2. Run each task (or only `task`) in configuration order
/// 3. Return one report per task run
///
/// # Errors
///
/// Setup errors only: client construction, unknown task or action, data
/// root creation.
pub async fn crawl(
    config: Config,
    registry: Arc<MimeRegistry>,
    task: Option<&str>,
) -> Result<Vec<TaskReport>> {
    let client = build_http_client(&config.crawler, &config.user_agent)?;
    let runner = TaskRunner::new(Arc::new(config), client, registry);
    runner.run_all(task).await
}
