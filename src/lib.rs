//! # edgequake-docs2md
//!
//! Batch-convert a directory tree of documents to Markdown, with a PDF
//! fallback chain and OCR for scanned PDFs.
//!
//! ## Pipeline Overview
//!
//! ```text
//! root/
//!  │
//!  ├─ 1. Walk      recurse, skip output folders / Markdown / history / done files
//!  ├─ 2. Primary   generic converter (markitdown) for every file
//!  ├─ 3. Fallback  PDFs only: pdfium text extraction shaped into Markdown
//!  ├─ 4. OCR       PDFs only: ocrmypdf → OCR/<rel>_ocr.pdf, then retry 2 and 3
//!  └─ 5. Output    MD_Folder/<dir__dir__stem>.md + history append
//! ```
//!
//! Each file is one unit of work. A run is resumable: every converted file is
//! recorded in a history file, and the next run skips it.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_docs2md::{convert_directory, BatchConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder("/data/docs").build()?;
//!     let summary = convert_directory(&config).await?;
//!     println!(
//!         "{} converted, {} failed, {} already done",
//!         summary.converted.len(),
//!         summary.failed.len(),
//!         summary.already_processed
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## External Tools
//!
//! The default engines shell out to `markitdown` and `ocrmypdf`, and bind the
//! pdfium shared library at runtime. Any of the three can be replaced through
//! [`BatchConfigBuilder`] by implementing [`PrimaryConverter`],
//! [`PdfFallbackConverter`] or [`OcrEngine`].
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docs2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-docs2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod history;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{BatchConfig, BatchConfigBuilder, FallbackOptions, OcrSettings};
pub use convert::{convert_directory, convert_directory_sync, convert_file};
pub use error::{Docs2MdError, StrategyError};
pub use history::{HistoryStore, ProcessedSet};
pub use layout::OutputLayout;
pub use output::{
    BatchSummary, ConversionResult, ConvertedFile, FailedFile, FailureReason, FileOutcome,
    Strategy,
};
pub use pipeline::fallback::{PdfFallbackConverter, PdfiumLayoutConverter};
pub use pipeline::ocr::{OcrEngine, OcrMyPdf};
pub use pipeline::primary::{MarkitdownCli, PrimaryConverter, PrimaryOutput};
pub use pipeline::walk::{CandidateFile, DirectoryWalker};
pub use progress::{
    ConversionProgressCallback, FallbackPhase, FallbackProgress, LoggingProgressCallback,
    NoopProgressCallback, ProgressCallback,
};
