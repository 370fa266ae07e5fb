//! Progress-callback trait for batch and fallback-converter events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::BatchConfigBuilder::progress_callback`] to receive events
//! as the batch moves through files, and as the fallback PDF converter moves
//! through pages.
//!
//! Callbacks are purely observational: nothing they do changes which strategy
//! runs or whether a file converts.
//!
//! # Example
//!
//! ```rust
//! use edgequake_docs2md::{ConversionProgressCallback, FallbackProgress};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct PageCounter {
//!     pages: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for PageCounter {
//!     fn on_fallback_progress(&self, progress: &FallbackProgress) {
//!         self.pages.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}", progress);
//!     }
//! }
//! ```

use crate::output::{ConversionResult, FailureReason};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Phase of a fallback PDF conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPhase {
    /// Opening the document.
    Loading,
    /// Pulling text out of each page.
    Extracting,
    /// Shaping extracted text into Markdown.
    Formatting,
    /// Conversion finished.
    Done,
}

impl FallbackPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackPhase::Loading => "loading",
            FallbackPhase::Extracting => "extracting",
            FallbackPhase::Formatting => "formatting",
            FallbackPhase::Done => "done",
        }
    }
}

/// One progress report from the fallback PDF converter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackProgress {
    pub phase: FallbackPhase,
    /// 1-indexed page being processed (0 before the first page).
    pub current_page: usize,
    pub total_pages: usize,
    /// Completion percentage, 0.0–100.0.
    pub percentage: f64,
    pub message: String,
}

impl FallbackProgress {
    pub fn new(
        phase: FallbackPhase,
        current_page: usize,
        total_pages: usize,
        message: impl Into<String>,
    ) -> Self {
        let percentage = match phase {
            FallbackPhase::Done => 100.0,
            _ if total_pages == 0 => 0.0,
            _ => (current_page.min(total_pages) as f64 / total_pages as f64) * 100.0,
        };
        Self {
            phase,
            current_page,
            total_pages,
            percentage,
            message: message.into(),
        }
    }
}

impl fmt::Display for FallbackProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Phase: {}, Page {}/{}, Progress: {:.1}%, Message: {}",
            self.phase.as_str(),
            self.current_page,
            self.total_pages,
            self.percentage,
            self.message
        )
    }
}

/// Called by the batch driver and the fallback converter.
///
/// Implementations must be `Send + Sync`: with `concurrency > 1` several files
/// are in flight at once and events for different files interleave. All
/// methods have default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once after the walk, before any file is converted.
    ///
    /// # Arguments
    /// * `total_files`       — candidates that will be attempted
    /// * `already_processed` — files skipped because history lists them
    fn on_batch_start(&self, total_files: usize, already_processed: usize) {
        let _ = (total_files, already_processed);
    }

    /// Called before the first strategy runs for a file.
    fn on_file_start(&self, rel_path: &str) {
        let _ = rel_path;
    }

    /// Called after a file's Markdown has been written.
    fn on_file_converted(&self, rel_path: &str, result: &ConversionResult) {
        let _ = (rel_path, result);
    }

    /// Called when a file ends without output.
    fn on_file_failed(&self, rel_path: &str, reason: &FailureReason) {
        let _ = (rel_path, reason);
    }

    /// Called from inside the fallback PDF converter, per phase and page.
    fn on_fallback_progress(&self, progress: &FallbackProgress) {
        let _ = progress;
    }

    /// Called once after every candidate has been attempted.
    fn on_batch_complete(&self, converted: usize, failed: usize) {
        let _ = (converted, failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Logs fallback progress lines through `tracing` at INFO.
pub struct LoggingProgressCallback;

impl ConversionProgressCallback for LoggingProgressCallback {
    fn on_fallback_progress(&self, progress: &FallbackProgress) {
        tracing::info!("{}", progress);
    }
}

/// Convenience alias matching the type stored in [`crate::config::BatchConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
