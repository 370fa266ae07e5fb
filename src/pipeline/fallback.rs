//! Fallback PDF converter: layout-aware text extraction via pdfium.
//!
//! Used only for PDFs, and only after the primary converter produced nothing.
//! [`PdfiumLayoutConverter`] reads each page's text layer with pdfium and
//! hands the page texts to [`crate::pipeline::postprocess`] for Markdown
//! shaping. A PDF without a text layer (a scan) yields the empty string,
//! which sends the pipeline on to OCR.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library behind an FFI boundary and is not async-aware.
//! Extraction runs on tokio's blocking pool so worker threads never stall on
//! a large document.

use crate::config::FallbackOptions;
use crate::error::StrategyError;
use crate::pipeline::postprocess::pages_to_markdown;
use crate::progress::{FallbackPhase, FallbackProgress, ProgressCallback};
use async_trait::async_trait;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Layout-aware PDF → Markdown engine.
#[async_trait]
pub trait PdfFallbackConverter: Send + Sync {
    fn name(&self) -> &str;
    async fn convert(&self, path: &Path) -> Result<String, StrategyError>;
}

/// Extracts page text with pdfium and shapes it into Markdown.
///
/// The pdfium library is located through `PDFIUM_LIB_PATH`, then the working
/// directory, then the system library search path.
pub struct PdfiumLayoutConverter {
    options: FallbackOptions,
    progress: Option<ProgressCallback>,
}

impl PdfiumLayoutConverter {
    pub fn new(options: FallbackOptions, progress: Option<ProgressCallback>) -> Self {
        Self { options, progress }
    }
}

impl Default for PdfiumLayoutConverter {
    fn default() -> Self {
        Self::new(FallbackOptions::default(), None)
    }
}

#[async_trait]
impl PdfFallbackConverter for PdfiumLayoutConverter {
    fn name(&self) -> &str {
        "pdfium-layout"
    }

    async fn convert(&self, path: &Path) -> Result<String, StrategyError> {
        let owned = path.to_path_buf();
        let progress = self.progress.clone();
        let pages = tokio::task::spawn_blocking(move || {
            extract_pages_blocking(&owned, progress.as_ref())
        })
        .await
        .map_err(|e| StrategyError::Internal(format!("Extraction task panicked: {}", e)))??;

        let total = pages.len();
        report(
            self.progress.as_ref(),
            FallbackProgress::new(FallbackPhase::Formatting, total, total, "Shaping markdown"),
        );
        let markdown = pages_to_markdown(&pages, &self.options);
        report(
            self.progress.as_ref(),
            FallbackProgress::new(
                FallbackPhase::Done,
                total,
                total,
                format!("{} chars", markdown.len()),
            ),
        );
        Ok(markdown)
    }
}

fn report(progress: Option<&ProgressCallback>, event: FallbackProgress) {
    if let Some(cb) = progress {
        cb.on_fallback_progress(&event);
    }
}

fn bind_pdfium(path: &Path) -> Result<Pdfium, StrategyError> {
    let bindings = match std::env::var_os("PDFIUM_LIB_PATH") {
        Some(lib) => Pdfium::bind_to_library(PathBuf::from(lib)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    };
    bindings.map(Pdfium::new).map_err(|e| StrategyError::Pdf {
        path: path.to_path_buf(),
        detail: format!("failed to bind pdfium: {:?}", e),
    })
}

/// Blocking implementation of page text extraction.
fn extract_pages_blocking(
    path: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<Vec<String>, StrategyError> {
    report(
        progress,
        FallbackProgress::new(
            FallbackPhase::Loading,
            0,
            0,
            format!("Opening {}", path.display()),
        ),
    );

    let pdfium = bind_pdfium(path)?;
    let document = pdfium
        .load_pdf_from_file(path, None)
        .map_err(|e| StrategyError::Pdf {
            path: path.to_path_buf(),
            detail: format!("{:?}", e),
        })?;

    let pages = document.pages();
    let total = pages.len() as usize;
    debug!("{}: {} pages", path.display(), total);

    let mut texts = Vec::with_capacity(total);
    for (idx, page) in pages.iter().enumerate() {
        let text = page.text().map_err(|e| StrategyError::Pdf {
            path: path.to_path_buf(),
            detail: format!("page {}: {:?}", idx + 1, e),
        })?;
        texts.push(text.all());
        report(
            progress,
            FallbackProgress::new(
                FallbackPhase::Extracting,
                idx + 1,
                total,
                format!("Extracted page {}", idx + 1),
            ),
        );
    }

    Ok(texts)
}
