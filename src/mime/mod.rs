//! MIME registry
//!
//! Maps a response content type to the canonical file extension payloads of
//! that type are saved with. The registry is built once per run, either from
//! the built-in table or from a reference document listing common MIME types,
//! and shared read-only afterwards.

mod builtin;

use crate::{Result, SpindleError};
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;

/// Content type to extension lookup table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeRegistry {
    extensions: HashMap<String, String>,
}

impl MimeRegistry {
    /// Registry over the common web MIME types
    pub fn builtin() -> Self {
        let mut registry = Self::default();
        for (mime, extension) in builtin::COMMON_TYPES {
            registry.register(mime, extension);
        }
        registry
    }

    /// Builds a registry from a "common MIME types" reference table
    ///
    /// Every table row with at least three cells is read as
    /// `extension | kind | MIME type`. When the extension cell lists several
    /// extensions the last one is kept; a MIME cell may list several types
    /// separated by commas, each is registered. The first row seen for a type
    /// wins.
    ///
    /// # Errors
    ///
    /// Returns `SpindleError::Mime` when no row could be read.
    pub fn from_reference_html(html: &str) -> Result<Self> {
        let document = Html::parse_document(html);
        let row_selector = Selector::parse("tr")
            .map_err(|e| SpindleError::Mime(format!("invalid row selector: {:?}", e)))?;
        let cell_selector = Selector::parse("td")
            .map_err(|e| SpindleError::Mime(format!("invalid cell selector: {:?}", e)))?;

        let mut registry = Self::default();

        for row in document.select(&row_selector) {
            let cells: Vec<String> = row
                .select(&cell_selector)
                .map(|cell| cell.text().collect::<String>())
                .collect();
            if cells.len() < 3 {
                continue;
            }

            let Some(extension) = cells[0]
                .split(|c: char| c == ',' || c.is_whitespace())
                .map(str::trim)
                .filter(|e| e.starts_with('.') && e.len() > 1)
                .last()
            else {
                continue;
            };

            for mime in cells[2].split(',').map(str::trim).filter(|m| m.contains('/')) {
                if registry.lookup_extension(mime).is_none() {
                    registry.register(mime, extension);
                }
            }
        }

        if registry.is_empty() {
            return Err(SpindleError::Mime(
                "reference document contains no MIME table rows".to_string(),
            ));
        }

        tracing::debug!("Loaded {} MIME types from reference document", registry.len());
        Ok(registry)
    }

    /// Downloads a reference document and builds a registry from it
    pub async fn fetch_reference(client: &Client, url: &str) -> Result<Self> {
        tracing::info!("Fetching MIME reference from {}", url);

        let response = client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| SpindleError::Http {
                url: url.to_string(),
                source,
            })?;
        let body = response.text().await.map_err(|source| SpindleError::Http {
            url: url.to_string(),
            source,
        })?;

        Self::from_reference_html(&body)
    }

    /// Canonical extension (with leading `.`) for a content type
    ///
    /// Parameters after `;` are ignored and the comparison is
    /// case-insensitive, so `Text/HTML; charset=utf-8` finds `.html`.
    pub fn lookup_extension(&self, content_type: &str) -> Option<&str> {
        self.extensions
            .get(&bare_type(content_type))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    fn register(&mut self, mime: &str, extension: &str) {
        let extension = if extension.starts_with('.') {
            extension.to_string()
        } else {
            format!(".{}", extension)
        };
        self.extensions.insert(bare_type(mime), extension);
    }
}

/// Content type without parameters, trimmed and lower-cased
pub fn bare_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}
