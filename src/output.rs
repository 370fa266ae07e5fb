//! Result types: per-file outcomes and the batch summary.
//!
//! A file ends the pipeline in exactly one of two states. [`FileOutcome::Converted`]
//! means Markdown was written and the path is recorded in history;
//! [`FileOutcome::Failed`] means nothing was written and the file will be
//! retried on the next run.

use crate::error::StrategyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// The strategy that produced a file's Markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Primary converter on the original file.
    Primary,
    /// Fallback PDF converter on the original file.
    Fallback,
    /// Primary converter on the OCR'd PDF.
    OcrPrimary,
    /// Fallback PDF converter on the OCR'd PDF.
    OcrFallback,
}

impl Strategy {
    /// Whether the OCR engine ran before this strategy.
    pub fn ocr_used(self) -> bool {
        matches!(self, Strategy::OcrPrimary | Strategy::OcrFallback)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Primary => "primary",
            Strategy::Fallback => "fallback",
            Strategy::OcrPrimary => "ocr+primary",
            Strategy::OcrFallback => "ocr+fallback",
        };
        f.write_str(s)
    }
}

/// Markdown produced for one file, with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    pub markdown: String,
    pub strategy: Strategy,
}

impl ConversionResult {
    pub fn ocr_used(&self) -> bool {
        self.strategy.ocr_used()
    }
}

/// A file whose Markdown was written to the output folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedFile {
    /// Path relative to the processing root, `/`-separated.
    pub rel_path: String,
    pub output_path: PathBuf,
    pub strategy: Strategy,
    pub ocr_used: bool,
    /// Byte length of the written Markdown.
    pub markdown_len: usize,
}

/// A file that reached terminal failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedFile {
    pub rel_path: String,
    pub reason: FailureReason,
}

/// Why a file produced no output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// Every applicable strategy returned empty output.
    NoOutput { ocr_attempted: bool },
    /// The OCR engine failed; no OCR-based strategy was attempted.
    OcrFailed { error: StrategyError },
    /// Markdown was produced but could not be written.
    WriteFailed { path: PathBuf, detail: String },
    /// Another file in this run already maps to the same output name.
    OutputCollision { claimed_by: String },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoOutput { ocr_attempted: true } => {
                f.write_str("no markdown output (OCR attempted)")
            }
            FailureReason::NoOutput { ocr_attempted: false } => f.write_str("no markdown output"),
            FailureReason::OcrFailed { error } => write!(f, "OCR failed: {error}"),
            FailureReason::WriteFailed { path, detail } => {
                write!(f, "failed to write '{}': {detail}", path.display())
            }
            FailureReason::OutputCollision { claimed_by } => {
                write!(f, "output name already used by '{claimed_by}'")
            }
        }
    }
}

/// Terminal state of one file.
#[derive(Debug, Clone)]
pub enum FileOutcome {
    Converted(ConvertedFile),
    Failed(FailedFile),
}

impl FileOutcome {
    pub fn rel_path(&self) -> &str {
        match self {
            FileOutcome::Converted(c) => &c.rel_path,
            FileOutcome::Failed(f) => &f.rel_path,
        }
    }

    pub fn is_converted(&self) -> bool {
        matches!(self, FileOutcome::Converted(_))
    }
}

/// Aggregate result of one batch run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchSummary {
    pub root: PathBuf,
    pub history_path: PathBuf,
    /// Candidates yielded by the walker (after history filtering).
    pub discovered: usize,
    /// Files skipped because they were already in history.
    pub already_processed: usize,
    pub converted: Vec<ConvertedFile>,
    pub failed: Vec<FailedFile>,
    pub duration_ms: u64,
}

impl BatchSummary {
    /// Number of converted files that needed OCR.
    pub fn ocr_count(&self) -> usize {
        self.converted.iter().filter(|c| c.ocr_used).count()
    }

    pub(crate) fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Converted(c) => self.converted.push(c),
            FileOutcome::Failed(f) => self.failed.push(f),
        }
    }
}
