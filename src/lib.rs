//! Spindle: a small depth-bounded web scraper
//!
//! This crate crawls the seed URLs of configured actions, follows hyperlinks up
//! to a bounded depth, deduplicates visited URLs in a per-action frontier tree,
//! filters payloads by MIME type and persists the matching ones to disk.

pub mod config;
pub mod crawler;
pub mod frontier;
pub mod link;
pub mod mime;
pub mod output;
pub mod state;
pub mod storage;

use thiserror::Error;

/// Main error type for Spindle operations
#[derive(Debug, Error)]
pub enum SpindleError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Write error: {0}")]
    Write(#[from] WriteError),

    #[error("MIME registry error: {0}")]
    Mime(String),

    #[error("Invalid transfer transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::TransferState,
        to: state::TransferState,
    },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Line {line}: {message}")]
    Syntax { line: usize, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Task '{task}' references unknown action '{action}'")]
    UnknownAction { task: String, action: String },
}

/// Filesystem errors raised by the content writer
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Result type alias for Spindle operations
pub type Result<T> = std::result::Result<T, SpindleError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{Action, ActionOption, Config, Task};
pub use frontier::FrontierTree;
pub use link::{extract_links, resolve, resolve_link, strip_scheme, Link};
pub use mime::MimeRegistry;
pub use state::TransferState;
