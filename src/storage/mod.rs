//! Content storage
//!
//! This module places downloaded payloads on disk:
//! - Path layout `<data-root>/<action>/[<run-stamp>/]<coarse type>/<file>`
//! - File name correction through the MIME registry
//! - Streaming writes, one handle per transfer
//! - The per-action `hyperlinks.txt` index

mod writer;

pub use writer::{coarse_type, file_name, sanitize_action_name, ContentWriter, PayloadFile};

/// Name of the per-action URL index
pub const HYPERLINKS_FILE: &str = "hyperlinks.txt";

/// Directory name used when a content type has no usable coarse part
pub const UNKNOWN_TYPE_DIR: &str = "unknown";
