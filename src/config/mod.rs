//! Configuration module for Spindle
//!
//! This module handles loading, parsing, and validating configuration files,
//! either TOML or the line-oriented `.sconf` grammar.
//!
//! # Example
//!
//! ```no_run
//! use spindle::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("spindle.toml")).unwrap();
//! for task in &config.tasks {
//!     println!("{} runs {} actions", task.name, task.actions.len());
//! }
//! ```

mod parser;
mod sconf;
mod types;
mod validation;

// Re-export types
pub use types::{
    Action, ActionOption, Config, CrawlerConfig, LaunchTime, OutputConfig, Task, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use sconf::parse_sconf;
pub use validation::validate_seed_url;
