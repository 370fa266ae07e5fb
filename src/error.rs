//! Error types for the edgequake-docs2md library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`Docs2MdError`] — **Fatal**: the batch cannot proceed at all (missing
//!   root directory, unreadable directory tree, history file not writable).
//!   Returned as `Err(Docs2MdError)` from [`crate::convert::convert_directory`].
//!
//! * [`StrategyError`] — **Non-fatal**: one conversion strategy failed on one
//!   file (converter crashed, OCR tool missing, corrupt PDF). The pipeline
//!   treats it as "produced no output" and moves on to the next strategy.
//!
//! Nothing that happens to a single file ever escalates into a
//! [`Docs2MdError`]; the run always continues with the next file.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-docs2md library.
#[derive(Debug, Error)]
pub enum Docs2MdError {
    // ── Setup errors ──────────────────────────────────────────────────────
    /// The processing root does not exist or is not a directory.
    #[error("Directory not found at '{}'", path.display())]
    RootNotFound { path: PathBuf },

    /// An output folder (Markdown or OCR) could not be created.
    #[error("Failed to create directory '{}': {source}", path.display())]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A directory inside the root could not be listed.
    #[error("Failed to walk '{}': {detail}", path.display())]
    WalkFailed { path: PathBuf, detail: String },

    // ── History errors ────────────────────────────────────────────────────
    /// The history file exists but could not be read.
    #[error("Failed to read history file '{}': {source}", path.display())]
    HistoryReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The history file could not be written.
    #[error("Failed to write history file '{}': {source}", path.display())]
    HistoryWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error raised by one strategy on one file.
///
/// Logged with its [`kind`](StrategyError::kind) and message, then treated as
/// empty output. Stored in [`crate::output::FailureReason::OcrFailed`] when it
/// ends the fallback chain.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum StrategyError {
    /// The external program is not installed or not on `PATH`.
    #[error("'{tool}' is not installed or not in PATH")]
    ToolNotFound { tool: String },

    /// The external program ran and exited unsuccessfully.
    #[error("'{tool}' exited with {status}: {stderr}")]
    ProcessFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    /// Reading or writing a file failed.
    #[error("I/O error on '{}': {detail}", path.display())]
    Io { path: PathBuf, detail: String },

    /// The program produced output that could not be interpreted.
    #[error("'{tool}' produced unreadable output: {detail}")]
    InvalidOutput { tool: String, detail: String },

    /// pdfium could not be bound or could not open the document.
    #[error("PDF error on '{}': {detail}", path.display())]
    Pdf { path: PathBuf, detail: String },

    /// A tool reported success but the expected artifact is missing.
    #[error("Expected output '{}' was not created", path.display())]
    OutputMissing { path: PathBuf },

    /// A worker task panicked or was cancelled.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl StrategyError {
    /// Short variant name used as the error "type" in log lines.
    pub fn kind(&self) -> &'static str {
        match self {
            StrategyError::ToolNotFound { .. } => "ToolNotFound",
            StrategyError::ProcessFailed { .. } => "ProcessFailed",
            StrategyError::Io { .. } => "Io",
            StrategyError::InvalidOutput { .. } => "InvalidOutput",
            StrategyError::Pdf { .. } => "Pdf",
            StrategyError::OutputMissing { .. } => "OutputMissing",
            StrategyError::Internal(_) => "Internal",
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        StrategyError::Io {
            path: path.into(),
            detail: err.to_string(),
        }
    }
}
