//! Sequential task execution
//!
//! Tasks run one after the other in configuration order; the sessions of one
//! task all drain before the next task starts.

use crate::config::{Config, Task};
use crate::crawler::orchestrator::Orchestrator;
use crate::mime::MimeRegistry;
use crate::output::TaskReport;
use crate::storage::ContentWriter;
use crate::{ConfigError, Result, WriteError};
use chrono::Utc;
use reqwest::Client;
use std::sync::Arc;

/// Runs the tasks of a configuration
pub struct TaskRunner {
    config: Arc<Config>,
    client: Client,
    registry: Arc<MimeRegistry>,
}

impl TaskRunner {
    pub fn new(config: Arc<Config>, client: Client, registry: Arc<MimeRegistry>) -> Self {
        Self {
            config,
            client,
            registry,
        }
    }

    /// Runs every task, or only the one named `only`
    ///
    /// # Errors
    ///
    /// Fails when `only` names no task, or on the first setup error of a
    /// task. Transfer failures never end a run.
    pub async fn run_all(&self, only: Option<&str>) -> Result<Vec<TaskReport>> {
        let tasks: Vec<&Task> = match only {
            Some(name) => {
                let task = self.config.task(name).ok_or_else(|| {
                    ConfigError::Validation(format!("no task named '{}'", name))
                })?;
                vec![task]
            }
            None => self.config.tasks.iter().collect(),
        };

        if tasks.is_empty() {
            tracing::warn!("No task to run");
        }

        let mut reports = Vec::with_capacity(tasks.len());
        for task in tasks {
            reports.push(self.run_task(task).await?);
        }
        Ok(reports)
    }

    /// Crawls every action of `task` until all of its sessions drain
    pub async fn run_task(&self, task: &Task) -> Result<TaskReport> {
        let actions = self.config.actions_for(task)?;
        let started = Utc::now();

        let data_root = &self.config.output.data_root;
        tokio::fs::create_dir_all(data_root)
            .await
            .map_err(|source| WriteError::CreateDir {
                path: data_root.display().to_string(),
                source,
            })?;

        let writer = Arc::new(ContentWriter::new(
            data_root,
            Arc::clone(&self.registry),
            started,
        ));
        let capacity = self.config.crawler.concurrency_cap(actions.len());

        tracing::info!(
            "Starting task '{}' (launch time {}): {} actions, up to {} transfers at once",
            task.name,
            task.launch_time(),
            actions.len(),
            capacity
        );

        let mut orchestrator =
            Orchestrator::new(self.client.clone(), writer, &self.config.crawler, capacity);
        for action in actions {
            let name = action.name.clone();
            if let Err(e) = orchestrator.start_session(action) {
                tracing::error!("Skipping action '{}': {}", name, e);
            }
        }

        let mut report = TaskReport::new(task.name.clone(), started);
        report.actions = orchestrator.run_until_drained().await;
        report.timed_out = orchestrator.timed_out();
        report.finished_at = Some(Utc::now());

        let totals = report.totals();
        tracing::info!(
            "Task '{}' finished: {} transfers, {} succeeded, {} failed, {} bytes saved",
            task.name,
            totals.transfers_started,
            totals.succeeded,
            totals.failed,
            totals.bytes_written
        );

        Ok(report)
    }
}
