//! Message file discovery and parsing.
//!
//! This module finds `*.txt` message files in a directory and parses their
//! `Key: Value` lines into records. Files that cannot be read are skipped
//! so that one damaged file does not sink the whole batch.

use chrono::{DateTime, Local, NaiveDateTime};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::models::Record;

/// Extension of message files.
pub const MESSAGE_EXTENSION: &str = "txt";

/// Naive layouts accepted for the `Date` field, tried in order.
const NAIVE_DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Errors that stop loading altogether.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Input directory not found: {0}")]
    NotFound(PathBuf),

    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Failed to list {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
}

/// A file that was discovered but could not be loaded.
#[derive(Debug, Clone)]
pub struct FailedFile {
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of loading a directory.
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    /// Records in file-name order.
    pub records: Vec<Record>,
    pub failed: Vec<FailedFile>,
}

impl LoadResult {
    /// Number of files that were discovered.
    pub fn discovered(&self) -> usize {
        self.records.len() + self.failed.len()
    }
}

/// Loads message files from a single directory.
pub struct MessageLoader {
    dir: PathBuf,
    fallback_time: Option<NaiveDateTime>,
}

impl MessageLoader {
    /// Create a loader for the given directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            fallback_time: None,
        }
    }

    /// Use a fixed timestamp for missing or unparseable dates.
    ///
    /// Defaults to the current local time when loading starts.
    pub fn with_fallback_time(mut self, time: NaiveDateTime) -> Self {
        self.fallback_time = Some(time);
        self
    }

    /// Find message files directly inside the directory, sorted by name.
    pub fn discover(&self) -> Result<Vec<PathBuf>, LoadError> {
        if !self.dir.exists() {
            return Err(LoadError::NotFound(self.dir.clone()));
        }
        if !self.dir.is_dir() {
            return Err(LoadError::NotADirectory(self.dir.clone()));
        }

        let mut files = Vec::new();
        let walker = WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|source| LoadError::Io {
                path: self.dir.clone(),
                source,
            })?;

            let path = entry.path();
            let is_message = entry.file_type().is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(MESSAGE_EXTENSION);
            if is_message {
                files.push(path.to_path_buf());
            }
        }

        info!("Discovered {} message files in {}", files.len(), self.dir.display());
        Ok(files)
    }

    /// Discover and parse every message file.
    pub fn load(&self) -> Result<LoadResult, LoadError> {
        let fallback = self
            .fallback_time
            .unwrap_or_else(|| Local::now().naive_local());
        let mut result = LoadResult::default();

        for path in self.discover()? {
            match fs::read_to_string(&path) {
                Ok(content) => {
                    result.records.push(parse_record(&content, &path, fallback));
                }
                Err(e) => {
                    warn!("Error loading {}: {}", path.display(), e);
                    result.failed.push(FailedFile {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!("Successfully loaded {} messages", result.records.len());
        Ok(result)
    }
}

/// Parse the `Key: Value` lines of one message file.
///
/// Missing fields become empty strings; a missing or unparseable `Date`
/// becomes `fallback`.
pub fn parse_record(content: &str, path: &Path, fallback: NaiveDateTime) -> Record {
    let mut fields: HashMap<&str, &str> = HashMap::new();

    for line in content.lines() {
        if let Some((key, value)) = line.split_once(':') {
            fields.insert(key.trim(), value.trim());
        }
    }

    let field = |key: &str| fields.get(key).copied().unwrap_or("").to_string();

    let timestamp = match fields.get("Date") {
        Some(raw) => parse_timestamp(raw).unwrap_or_else(|| {
            warn!("Unparseable date '{}' in {}, using fallback", raw, path.display());
            fallback
        }),
        None => {
            debug!("No date in {}, using fallback", path.display());
            fallback
        }
    };

    Record {
        id: field("ID"),
        subject: field("Subject"),
        sender: field("From"),
        recipient: field("To"),
        timestamp,
        body: field("Content"),
        origin_path: path.to_string_lossy().to_string(),
    }
}

/// Parse a `Date` value as a naive wall-clock time.
///
/// RFC 3339 values keep the wall clock as written; the offset is dropped,
/// never applied to the host timezone.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    NAIVE_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}
