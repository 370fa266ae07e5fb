//! Directory walking: enumerate the files a batch should attempt.
//!
//! The walker is a pure filter over the file-system tree. It never writes
//! anything; it only decides which regular files are candidates.
//!
//! Excluded:
//! * everything under a directory named like the Markdown or OCR output
//!   folder (pruned, never descended into);
//! * `.md` / `.markdown` files (case-insensitive);
//! * the history file, matched by name and by path;
//! * OCR artifacts (`*_ocr.pdf`, case-insensitive);
//! * files whose relative path is already in the processed set.

use crate::config::BatchConfig;
use crate::error::Docs2MdError;
use crate::history::ProcessedSet;
use crate::layout::relative_path;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// An input file discovered by the walker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// Path as found under the root.
    pub path: PathBuf,
    /// Path relative to the root, `/`-separated.
    pub rel_path: String,
    pub file_name: String,
    /// Lower-cased extension without the dot.
    pub extension: Option<String>,
}

impl CandidateFile {
    pub fn new(root: &Path, path: PathBuf) -> Option<Self> {
        let rel_path = relative_path(root, &path)?;
        let file_name = path.file_name()?.to_string_lossy().into_owned();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());
        Some(Self {
            path,
            rel_path,
            file_name,
            extension,
        })
    }

    /// PDF detection is by file name suffix, case-insensitive.
    pub fn is_pdf(&self) -> bool {
        self.file_name.to_lowercase().ends_with(".pdf")
    }
}

/// Candidates plus how many files history filtered out.
#[derive(Debug, Default)]
pub struct WalkReport {
    pub candidates: Vec<CandidateFile>,
    pub already_processed: usize,
}

/// Recursive walker over a processing root.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    root: PathBuf,
    pruned_dirs: Vec<OsString>,
    history_path: PathBuf,
    history_name: Option<OsString>,
}

impl DirectoryWalker {
    pub fn new(
        root: impl Into<PathBuf>,
        pruned_dirs: &[&str],
        history_path: impl Into<PathBuf>,
    ) -> Self {
        let history_path = history_path.into();
        Self {
            root: root.into(),
            pruned_dirs: pruned_dirs.iter().map(OsString::from).collect(),
            history_name: history_path.file_name().map(|n| n.to_os_string()),
            history_path,
        }
    }

    /// Walker for `config`'s root, pruning its output folders.
    pub fn from_config(config: &BatchConfig) -> Self {
        Self::new(
            &config.root,
            &[config.md_folder.as_str(), config.ocr_folder.as_str()],
            config.history_file(),
        )
    }

    /// Walk the tree and collect candidates not yet in `processed`.
    ///
    /// Any directory that cannot be listed aborts the walk.
    pub fn walk(&self, processed: &ProcessedSet) -> Result<WalkReport, Docs2MdError> {
        if !self.root.is_dir() {
            return Err(Docs2MdError::RootNotFound {
                path: self.root.clone(),
            });
        }

        let mut report = WalkReport::default();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                !(e.depth() > 0 && e.file_type().is_dir() && self.is_pruned(e.file_name()))
            });

        for entry in walker {
            let entry = entry.map_err(|e| Docs2MdError::WalkFailed {
                path: e.path().unwrap_or(self.root.as_path()).to_path_buf(),
                detail: e.to_string(),
            })?;

            if entry.file_type().is_dir() || !entry.path().is_file() {
                continue;
            }

            let Some(candidate) = CandidateFile::new(&self.root, entry.into_path()) else {
                continue;
            };

            if self.is_excluded(&candidate) {
                trace!("Excluded {}", candidate.rel_path);
                continue;
            }

            if processed.contains(&candidate.rel_path) {
                trace!("Already processed {}", candidate.rel_path);
                report.already_processed += 1;
                continue;
            }

            report.candidates.push(candidate);
        }

        debug!(
            "Walk of {} found {} candidates ({} already processed)",
            self.root.display(),
            report.candidates.len(),
            report.already_processed
        );
        Ok(report)
    }

    fn is_pruned(&self, name: &std::ffi::OsStr) -> bool {
        self.pruned_dirs.iter().any(|d| d == name)
    }

    fn is_excluded(&self, candidate: &CandidateFile) -> bool {
        let is_markdown = candidate
            .extension
            .as_deref()
            .is_some_and(|e| MARKDOWN_EXTENSIONS.contains(&e));
        let is_history = self
            .history_name
            .as_deref()
            .is_some_and(|n| n == std::ffi::OsStr::new(&candidate.file_name))
            || candidate.path == self.history_path;
        let is_ocr_artifact = candidate.file_name.to_lowercase().ends_with("_ocr.pdf");

        is_markdown || is_history || is_ocr_artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, b"x").unwrap();
    }

    fn walker(root: &Path) -> DirectoryWalker {
        DirectoryWalker::new(root, &["MD_Folder", "OCR"], root.join(".markitdown_history"))
    }

    fn rels(report: &WalkReport) -> Vec<&str> {
        report.candidates.iter().map(|c| c.rel_path.as_str()).collect()
    }

    #[test]
    fn yields_nested_files_with_relative_paths() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "a/b/report.pdf");
        touch(dir.path(), "memo.docx");
        let report = walker(dir.path()).walk(&ProcessedSet::new()).unwrap();
        assert_eq!(rels(&report), vec!["a/b/report.pdf", "memo.docx"]);
    }

    #[test]
    fn skips_markdown_history_and_ocr_artifacts() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "notes.md");
        touch(dir.path(), "README.MARKDOWN");
        touch(dir.path(), ".markitdown_history");
        touch(dir.path(), "sub/.markitdown_history");
        touch(dir.path(), "scan_OCR.PDF");
        touch(dir.path(), "keep.txt");
        let report = walker(dir.path()).walk(&ProcessedSet::new()).unwrap();
        assert_eq!(rels(&report), vec!["keep.txt"]);
    }

    #[test]
    fn prunes_output_folders_at_any_depth() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "MD_Folder/x.txt");
        touch(dir.path(), "OCR/a/report.pdf");
        touch(dir.path(), "deep/OCR/other.pdf");
        touch(dir.path(), "deep/real.pdf");
        let report = walker(dir.path()).walk(&ProcessedSet::new()).unwrap();
        assert_eq!(rels(&report), vec!["deep/real.pdf"]);
    }

    #[test]
    fn processed_files_are_counted_not_yielded() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "report.docx");
        touch(dir.path(), "new.pdf");
        let processed: ProcessedSet = ["report.docx".to_string()].into_iter().collect();
        let report = walker(dir.path()).walk(&processed).unwrap();
        assert_eq!(rels(&report), vec!["new.pdf"]);
        assert_eq!(report.already_processed, 1);
    }

    #[test]
    fn missing_root_is_fatal() {
        let dir = TempDir::new().unwrap();
        let w = walker(&dir.path().join("nope"));
        assert!(matches!(
            w.walk(&ProcessedSet::new()),
            Err(Docs2MdError::RootNotFound { .. })
        ));
    }

    #[test]
    fn candidate_pdf_detection_is_case_insensitive() {
        let root = Path::new("/data");
        let c = CandidateFile::new(root, root.join("Scan.PDF")).unwrap();
        assert!(c.is_pdf());
        assert_eq!(c.extension.as_deref(), Some("pdf"));
        let c = CandidateFile::new(root, root.join("a/report.docx")).unwrap();
        assert!(!c.is_pdf());
        assert_eq!(c.rel_path, "a/report.docx");
    }
}
