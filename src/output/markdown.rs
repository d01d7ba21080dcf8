//! Markdown summary generation
//!
//! This module renders the task reports of a run as a human-readable
//! markdown file.

use crate::output::report::{OutputError, OutputResult, TaskReport};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown summary of `reports` to `output_path`
///
/// Missing parent directories are created.
pub fn generate_markdown_summary(reports: &[TaskReport], output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_summary(reports);
    let write_err = |source| OutputError::Write {
        path: output_path.display().to_string(),
        source,
    };

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let mut file = File::create(output_path).map_err(write_err)?;
    file.write_all(markdown.as_bytes()).map_err(write_err)?;

    Ok(())
}

/// Formats the task reports as markdown
pub fn format_markdown_summary(reports: &[TaskReport]) -> String {
    let mut md = String::new();

    md.push_str("# Spindle Crawl Summary\n\n");

    for report in reports {
        md.push_str(&format!("## Task: {}\n\n", report.task));
        md.push_str(&format!("- **Started**: {}\n", report.started_at.to_rfc3339()));
        if let Some(finished) = report.finished_at {
            md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
        }
        if let Some(duration) = report.duration_seconds() {
            md.push_str(&format!("- **Duration**: {} seconds\n", duration));
        }
        if report.timed_out {
            md.push_str("- **Status**: timed out\n");
        } else {
            md.push_str("- **Status**: completed\n");
        }

        let totals = report.totals();
        md.push_str(&format!(
            "- **Success Rate**: {:.2}%\n\n",
            totals.success_rate()
        ));

        if report.actions.is_empty() {
            md.push_str("No actions were run.\n\n");
            continue;
        }

        md.push_str("| Action | Transfers | Succeeded | Failed | Kept | Discarded | Bytes | Links Scheduled | Max Depth |\n");
        md.push_str("|--------|-----------|-----------|--------|------|-----------|-------|-----------------|-----------|\n");
        for stats in &report.actions {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
                stats.action,
                stats.transfers_started,
                stats.succeeded,
                stats.failed,
                stats.files_kept,
                stats.files_discarded,
                stats.bytes_written,
                stats.links_scheduled,
                stats.max_depth_reached
            ));
        }
        md.push('\n');

        let write_errors: u64 = report.actions.iter().map(|s| s.write_errors).sum();
        if write_errors > 0 {
            md.push_str(&format!("Filesystem errors: {}\n\n", write_errors));
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SessionStats;
    use chrono::{Duration, TimeZone, Utc};
    use tempfile::TempDir;

    fn create_test_report() -> TaskReport {
        let started = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut report = TaskReport::new("nightly", started);
        report.finished_at = Some(started + Duration::seconds(3600));

        let mut stats = SessionStats::new("site");
        stats.transfers_started = 12;
        stats.succeeded = 10;
        stats.failed = 2;
        stats.files_kept = 9;
        stats.bytes_written = 5000;
        report.actions.push(stats);
        report
    }

    #[test]
    fn test_format_markdown_summary() {
        let markdown = format_markdown_summary(&[create_test_report()]);

        assert!(markdown.contains("# Spindle Crawl Summary"));
        assert!(markdown.contains("## Task: nightly"));
        assert!(markdown.contains("- **Duration**: 3600 seconds"));
        assert!(markdown.contains("- **Status**: completed"));
        assert!(markdown.contains("| site | 12 | 10 | 2 | 9 | 0 | 5000 | 0 | 0 |"));
    }

    #[test]
    fn test_markdown_marks_timeouts_and_errors() {
        let mut report = create_test_report();
        report.timed_out = true;
        report.actions[0].write_errors = 3;

        let markdown = format_markdown_summary(&[report]);
        assert!(markdown.contains("timed out"));
        assert!(markdown.contains("Filesystem errors: 3"));
    }

    #[test]
    fn test_markdown_empty_task() {
        let started = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let markdown = format_markdown_summary(&[TaskReport::new("idle", started)]);
        assert!(markdown.contains("No actions were run."));
    }

    #[test]
    fn test_generate_markdown_summary_creates_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("reports").join("summary.md");

        generate_markdown_summary(&[create_test_report()], &path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("nightly"));
    }
}
