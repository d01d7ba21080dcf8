use crate::config::Action;
use crate::frontier::FrontierTree;
use crate::link::strip_scheme;
use crate::mime::{bare_type, MimeRegistry};
use crate::storage::{HYPERLINKS_FILE, UNKNOWN_TYPE_DIR};
use crate::WriteError;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;

/// Characters that cannot appear in a file or directory name
const ILLEGAL_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Format of the per-run directory used by versioned actions
const RUN_STAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Writes payloads and hyperlink indexes below a data root
///
/// One writer is built per task run and shared by every transfer of that
/// run. Besides computing paths it remembers which payload paths the run has
/// already handed out, so two URLs ending in the same segment never share a
/// file.
#[derive(Debug)]
pub struct ContentWriter {
    data_root: PathBuf,
    registry: Arc<MimeRegistry>,
    run_stamp: String,
    claimed: Mutex<HashSet<PathBuf>>,
}

impl ContentWriter {
    pub fn new(
        data_root: impl Into<PathBuf>,
        registry: Arc<MimeRegistry>,
        run_started: DateTime<Utc>,
    ) -> Self {
        Self {
            data_root: data_root.into(),
            registry,
            run_stamp: run_started.format(RUN_STAMP_FORMAT).to_string(),
            claimed: Mutex::new(HashSet::new()),
        }
    }

    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Directory stamp of this run, used when an action keeps versions
    pub fn run_stamp(&self) -> &str {
        &self.run_stamp
    }

    /// `<data-root>/<sanitized action name>`
    pub fn action_dir(&self, action: &Action) -> PathBuf {
        self.data_root.join(sanitize_action_name(&action.name))
    }

    /// Destination of a payload
    ///
    /// Versioned actions get an extra run-stamp directory between the action
    /// directory and the coarse type, so earlier runs are never overwritten.
    pub fn make_path(&self, action: &Action, content_type: &str, url: &str) -> PathBuf {
        let mut path = self.action_dir(action);
        if action.versioning() {
            path.push(&self.run_stamp);
        }
        path.push(coarse_type(content_type));
        path.push(file_name(url, content_type, &self.registry));
        path
    }

    /// Opens a payload for writing, creating missing directories
    ///
    /// `path` is reserved for this run first: if another transfer of the run
    /// already holds it, the payload is saved as `<stem>-<n><ext>` instead
    /// and [`PayloadFile::path`] reports the name actually used. A file left
    /// by an earlier run is truncated.
    pub async fn create(&self, path: &Path) -> Result<PayloadFile, WriteError> {
        let reserved = self.claim(path);
        let path = reserved.as_path();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|source| WriteError::CreateDir {
                    path: parent.display().to_string(),
                    source,
                })?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(|source| WriteError::Open {
                path: path.display().to_string(),
                source,
            })?;

        Ok(PayloadFile {
            path: path.to_path_buf(),
            file,
            written: 0,
        })
    }

    /// Reserves `path` for one transfer, suffixing it when already taken
    fn claim(&self, path: &Path) -> PathBuf {
        let mut claimed = self
            .claimed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if claimed.insert(path.to_path_buf()) {
            return path.to_path_buf();
        }

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (stem, extension) = match name.rfind('.') {
            Some(dot) if dot > 0 => name.split_at(dot),
            _ => (name.as_str(), ""),
        };

        let mut n = 1u64;
        loop {
            let candidate = path.with_file_name(format!("{}-{}{}", stem, n, extension));
            if claimed.insert(candidate.clone()) {
                tracing::info!(
                    "{} already written in this run, saving as {}",
                    path.display(),
                    candidate.display()
                );
                return candidate;
            }
            n += 1;
        }
    }

    /// Removes a payload; failures are logged and otherwise ignored
    pub async fn delete(&self, path: &Path) -> bool {
        match fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!("Deleted {}", path.display());
                true
            }
            Err(e) => {
                tracing::warn!("Failed to delete {}: {}", path.display(), e);
                false
            }
        }
    }

    /// Writes every scheduled URL of `tree` to the action's `hyperlinks.txt`
    pub async fn write_hyperlinks(
        &self,
        action: &Action,
        tree: &FrontierTree,
    ) -> Result<PathBuf, WriteError> {
        let dir = self.action_dir(action);
        fs::create_dir_all(&dir)
            .await
            .map_err(|source| WriteError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;

        let path = dir.join(HYPERLINKS_FILE);
        let mut content = String::new();
        for (url, _) in tree.scheduled_urls() {
            content.push_str(&url);
            content.push('\n');
        }

        fs::write(&path, content)
            .await
            .map_err(|source| WriteError::Write {
                path: path.display().to_string(),
                source,
            })?;

        Ok(path)
    }
}

/// An open payload receiving the body of one transfer
#[derive(Debug)]
pub struct PayloadFile {
    path: PathBuf,
    file: File,
    written: u64,
}

impl PayloadFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes appended so far
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Appends one chunk of the body
    pub async fn append(&mut self, bytes: &[u8]) -> Result<(), WriteError> {
        self.file
            .write_all(bytes)
            .await
            .map_err(|source| WriteError::Write {
                path: self.path.display().to_string(),
                source,
            })?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Flushes the file and returns its path and size
    pub async fn finish(mut self) -> Result<(PathBuf, u64), WriteError> {
        self.file
            .flush()
            .await
            .map_err(|source| WriteError::Write {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok((self.path, self.written))
    }
}

/// Directory name for an action: spaces become `_`, illegal characters go
pub fn sanitize_action_name(name: &str) -> String {
    let sanitized: String = name
        .trim()
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();

    match sanitized.as_str() {
        "" | "." | ".." => "action".to_string(),
        _ => sanitized,
    }
}

/// Part of a content type before its first `/`, lower-cased
pub fn coarse_type(content_type: &str) -> String {
    let bare = bare_type(content_type);
    let coarse: String = bare
        .split('/')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control() && !c.is_whitespace())
        .collect();

    if coarse.is_empty() || coarse == "." || coarse == ".." {
        UNKNOWN_TYPE_DIR.to_string()
    } else {
        coarse
    }
}

/// File name for a payload fetched from `url`
///
/// Takes the last non-empty path segment after the host (`index` when the
/// URL has none), without query or fragment and with illegal characters
/// removed, then appends the registry extension for `content_type` unless the
/// name already ends with it. An unknown content type leaves the name as is.
pub fn file_name(url: &str, content_type: &str, registry: &MimeRegistry) -> String {
    let stripped = strip_scheme(url);
    let path = stripped
        .split(|c: char| c == '?' || c == '#')
        .next()
        .unwrap_or_default();

    let last = path
        .split('/')
        .filter(|s| !s.is_empty())
        .skip(1)
        .last()
        .map(|segment| {
            segment
                .chars()
                .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
                .collect::<String>()
        })
        .filter(|s| !s.is_empty() && s != "." && s != "..");

    let mut name = last.unwrap_or_else(|| "index".to_string());

    if let Some(extension) = registry.lookup_extension(content_type) {
        if !name.to_ascii_lowercase().ends_with(extension) {
            name.push_str(extension);
        }
    }

    name
}
