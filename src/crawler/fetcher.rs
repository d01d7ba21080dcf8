//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client with the configured user agent and timeouts
//! - Deciding, once headers arrive, whether a body is written to disk
//! - Streaming the body chunk by chunk into its payload file
//! - Error classification

use crate::config::{Action, CrawlerConfig, UserAgentConfig};
use crate::storage::{ContentWriter, PayloadFile};
use crate::WriteError;
use reqwest::{header::CONTENT_TYPE, Client};
use std::path::PathBuf;
use std::time::Duration;

/// What a transfer does with its body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistPlan {
    /// The content type is selected by the action
    pub keep: bool,

    /// HTML below the action's depth bound: links are extracted from it
    pub extract: bool,
}

impl PersistPlan {
    /// Decides from the response headers and the depth of the transfer
    ///
    /// Depth uses a strict comparison, so a page fetched at `max_depth` is
    /// saved when selected but its links are not followed.
    pub fn decide(action: &Action, content_type: &str, depth: i32) -> Self {
        Self {
            keep: action.is_selected(content_type),
            extract: is_html(content_type) && depth < action.max_depth() as i32,
        }
    }

    /// The body is written to disk
    pub fn persists(&self) -> bool {
        self.keep || self.extract
    }

    /// The body is on disk only for extraction and goes once links are read
    pub fn is_extraction_only(&self) -> bool {
        self.extract && !self.keep
    }
}

/// Returns true for HTML content types
pub fn is_html(content_type: &str) -> bool {
    content_type.contains("text/html")
}

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// The server answered 2xx and the body was read to the end
    Success {
        /// Final URL after redirects
        final_url: String,
        status_code: u16,
        /// Content-Type header value, empty when absent
        content_type: String,
        plan: PersistPlan,
        /// Payload file, when the plan persists and writing succeeded
        payload: Option<PathBuf>,
        /// Whole body, kept in memory when the plan extracts links
        body: Option<Vec<u8>>,
        bytes_received: u64,
        bytes_written: u64,
        /// Filesystem failure that stopped the payload from being written
        write_error: Option<WriteError>,
    },

    /// The server answered with a non-2xx status
    HttpError { final_url: String, status_code: u16 },

    /// Connection refused, timeout, broken body stream, ...
    NetworkError { error: String },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Builds the HTTP client shared by every transfer of a run
///
/// Redirects are followed transparently with the default policy; the
/// effective URL of a response is the one links are resolved against.
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.user_agent_string())
        .timeout(Duration::from_secs(crawler.transfer_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one URL for `action` and streams its body to disk when needed
///
/// # Request Flow
///
/// 1. Send the GET request
/// 2. Non-2xx status → `HttpError`, body ignored
/// 3. Decide the [`PersistPlan`] from the Content-Type and `depth`
/// 4. If persisting, open the payload at the writer's path for the
///    effective URL
/// 5. Append every body chunk as it arrives, and buffer it too when links
///    are to be extracted
///
/// A filesystem failure stops the writing but not the transfer: the body is
/// still drained and the failure is reported in `write_error`. A broken body
/// stream makes the whole transfer a `NetworkError` and removes the partial
/// payload.
pub async fn fetch_url(
    client: &Client,
    writer: &ContentWriter,
    action: &Action,
    url: &str,
    depth: i32,
) -> FetchResult {
    let mut response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => return FetchResult::NetworkError { error: classify(&e) },
    };

    let status = response.status();
    let final_url = response.url().to_string();

    if !status.is_success() {
        return FetchResult::HttpError {
            final_url,
            status_code: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let plan = PersistPlan::decide(action, &content_type, depth);
    tracing::trace!("{} [{}] depth {}: {:?}", final_url, content_type, depth, plan);

    let mut write_error = None;
    let mut payload: Option<PayloadFile> = None;
    if plan.persists() {
        let path = writer.make_path(action, &content_type, &final_url);
        match writer.create(&path).await {
            Ok(file) => payload = Some(file),
            Err(e) => write_error = Some(e),
        }
    }

    let mut body = plan.extract.then(Vec::new);
    let mut bytes_received = 0u64;
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                bytes_received += chunk.len() as u64;
                if let Some(body) = body.as_mut() {
                    body.extend_from_slice(&chunk);
                }
                if let Some(file) = payload.as_mut() {
                    if let Err(e) = file.append(&chunk).await {
                        let path = file.path().to_path_buf();
                        payload = None;
                        writer.delete(&path).await;
                        write_error = Some(e);
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                if let Some(file) = payload.take() {
                    writer.delete(file.path()).await;
                }
                return FetchResult::NetworkError { error: classify(&e) };
            }
        }
    }

    let (payload, bytes_written) = match payload {
        Some(file) => match file.finish().await {
            Ok((path, written)) => (Some(path), written),
            Err(e) => {
                write_error = Some(e);
                (None, 0)
            }
        },
        None => (None, 0),
    };

    FetchResult::Success {
        final_url,
        status_code: status.as_u16(),
        content_type,
        plan,
        payload,
        body,
        bytes_received,
        bytes_written,
        write_error,
    }
}

fn classify(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timeout: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}
