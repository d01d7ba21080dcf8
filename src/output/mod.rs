//! Output module for crawl statistics and summaries
//!
//! This module handles:
//! - Per-session counters collected while crawling
//! - Task reports and the console report
//! - The markdown summary file

mod markdown;
mod report;
pub mod stats;

pub use markdown::{format_markdown_summary, generate_markdown_summary};
pub use report::{print_report, OutputError, OutputResult, TaskReport};
pub use stats::SessionStats;
