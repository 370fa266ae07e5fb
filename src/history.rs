//! History Store: the cross-run record of successfully converted files.
//!
//! The history file is plain text, one `/`-separated relative path per line.
//! A path is only ever written after its Markdown output exists, so a file
//! missing from history is retried on every run until it converts.
//!
//! Writes happen in two places:
//! * [`HistoryStore::append`] after each success, so an interrupted run keeps
//!   everything that finished before the interruption;
//! * [`HistoryStore::save`] once at the end, atomically rewriting the file
//!   with the sorted union (which also drops duplicate lines left by appends).

use crate::error::Docs2MdError;
use std::collections::BTreeSet;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Relative paths already converted.
pub type ProcessedSet = BTreeSet<String>;

/// File-backed history of processed paths.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the processed set; a missing file yields an empty set.
    ///
    /// Lines are trimmed and blank lines ignored.
    pub fn load(&self) -> Result<ProcessedSet, Docs2MdError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No history at {}, starting fresh", self.path.display());
                return Ok(ProcessedSet::new());
            }
            Err(source) => {
                return Err(Docs2MdError::HistoryReadFailed {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let set: ProcessedSet = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();
        debug!("Loaded {} history entries from {}", set.len(), self.path.display());
        Ok(set)
    }

    /// Append one path immediately after it converted.
    pub fn append(&self, rel_path: &str) -> Result<(), Docs2MdError> {
        let write = || -> io::Result<()> {
            let mut f = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            writeln!(f, "{rel_path}")?;
            f.flush()
        };
        write().map_err(|source| Docs2MdError::HistoryWriteFailed {
            path: self.path.clone(),
            source,
        })
    }

    /// Overwrite the history file with `paths`, one per line.
    ///
    /// Uses atomic write (temp file in the same directory + rename) so a crash
    /// mid-write never leaves a truncated history.
    pub fn save(&self, paths: &ProcessedSet) -> Result<(), Docs2MdError> {
        let map_err = |source: io::Error| Docs2MdError::HistoryWriteFailed {
            path: self.path.clone(),
            source,
        };

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(map_err)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent).map_err(map_err)?;
        for path in paths {
            writeln!(tmp, "{path}").map_err(map_err)?;
        }
        tmp.flush().map_err(map_err)?;
        tmp.persist(&self.path).map_err(|e| map_err(e.error))?;

        debug!("Saved {} history entries to {}", paths.len(), self.path.display());
        Ok(())
    }
}
