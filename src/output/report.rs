//! Task reports and output errors

use crate::output::stats::SessionStats;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while writing reports
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write summary {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Outcome of one task run
#[derive(Debug, Clone)]
pub struct TaskReport {
    pub task: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// True when the crawl timeout cut the run short
    pub timed_out: bool,

    /// One entry per action, in task order
    pub actions: Vec<SessionStats>,
}

impl TaskReport {
    pub fn new(task: impl Into<String>, started_at: DateTime<Utc>) -> Self {
        Self {
            task: task.into(),
            started_at,
            finished_at: None,
            timed_out: false,
            actions: Vec::new(),
        }
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    /// Counters of every action summed together
    pub fn totals(&self) -> SessionStats {
        let mut totals = SessionStats::new(self.task.clone());
        for stats in &self.actions {
            totals.absorb(stats);
        }
        totals
    }
}

/// Prints a short report of the runs to stdout
pub fn print_report(reports: &[TaskReport]) {
    println!("=== Crawl Report ===\n");

    for report in reports {
        print!("Task '{}'", report.task);
        if let Some(duration) = report.duration_seconds() {
            print!(" ({}s)", duration);
        }
        if report.timed_out {
            print!(" [timed out]");
        }
        println!();

        for stats in &report.actions {
            println!(
                "  {}: {} transfers, {} ok, {} failed, {} files kept, {} bytes, depth {}",
                stats.action,
                stats.transfers_started,
                stats.succeeded,
                stats.failed,
                stats.files_kept,
                stats.bytes_written,
                stats.max_depth_reached
            );
        }

        let totals = report.totals();
        println!(
            "  Success Rate: {:.1}% ({} / {} transfers)\n",
            totals.success_rate(),
            totals.succeeded,
            totals.completed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn test_duration_and_totals() {
        let started = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut report = TaskReport::new("nightly", started);
        assert_eq!(report.duration_seconds(), None);

        report.finished_at = Some(started + Duration::seconds(90));
        let mut a = SessionStats::new("a");
        a.succeeded = 4;
        let mut b = SessionStats::new("b");
        b.succeeded = 1;
        b.failed = 2;
        report.actions = vec![a, b];

        assert_eq!(report.duration_seconds(), Some(90));
        let totals = report.totals();
        assert_eq!(totals.action, "nightly");
        assert_eq!(totals.succeeded, 5);
        assert_eq!(totals.failed, 2);
    }
}
