//! Batch conversion entry points and the per-file fallback chain.
//!
//! ## The fallback chain
//!
//! Every candidate file runs through at most five attempts, stopping at the
//! first one that produces Markdown:
//!
//! ```text
//! PRIMARY ──empty──▶ not a PDF ──────────────────────────────▶ FAILURE
//!    │                 │ PDF
//!    │                 ▼
//!    │            FALLBACK_PDF (skipped when the output already exists)
//!    │                 │ empty
//!    │                 ▼
//!    │                OCR ──error──▶ FAILURE
//!    │                 │ ok
//!    │                 ▼
//!    │            OCR_PRIMARY ──empty──▶ OCR_FALLBACK ──empty──▶ FAILURE
//!    ▼                 ▼                      ▼
//! SUCCESS           SUCCESS                SUCCESS
//! ```
//!
//! Each attempt yields a [`StrategyOutcome`]; an error from any engine is
//! logged and counts as empty output. Only SUCCESS writes a file and records
//! the path in history, so failures are retried on the next run.
//!
//! ## Batch driver
//!
//! [`convert_directory`] walks the root, filters against history, and runs
//! each file's chain as one unit of work through a bounded pool
//! (`buffer_unordered(config.concurrency)`). Results are drained by a single
//! loop, which is the only writer of the history file.

use crate::config::{BatchConfig, OcrSettings};
use crate::error::{Docs2MdError, StrategyError};
use crate::history::{HistoryStore, ProcessedSet};
use crate::layout::{markdown_file_name, OutputLayout};
use crate::output::{
    BatchSummary, ConversionResult, ConvertedFile, FailedFile, FailureReason, FileOutcome,
    Strategy,
};
use crate::pipeline::fallback::{PdfFallbackConverter, PdfiumLayoutConverter};
use crate::pipeline::ocr::{OcrEngine, OcrMyPdf};
use crate::pipeline::primary::{MarkitdownCli, PrimaryConverter};
use crate::pipeline::walk::{CandidateFile, DirectoryWalker};
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Result of one strategy attempt.
#[derive(Debug)]
pub enum StrategyOutcome {
    Converted(String),
    Empty,
    Failed(StrategyError),
}

impl StrategyOutcome {
    fn from_result(result: Result<String, StrategyError>) -> Self {
        match result {
            Ok(md) if md.is_empty() => StrategyOutcome::Empty,
            Ok(md) => StrategyOutcome::Converted(md),
            Err(e) => StrategyOutcome::Failed(e),
        }
    }
}

/// The three engines, resolved once per run.
#[derive(Clone)]
pub struct Engines {
    pub primary: Arc<dyn PrimaryConverter>,
    pub fallback: Arc<dyn PdfFallbackConverter>,
    pub ocr: Arc<dyn OcrEngine>,
}

impl Engines {
    /// Use injected engines from `config`, else build the default adapters.
    pub fn resolve(config: &BatchConfig) -> Self {
        let primary: Arc<dyn PrimaryConverter> = match &config.primary {
            Some(p) => Arc::clone(p),
            None => Arc::new(MarkitdownCli::new(&config.markitdown_program)),
        };
        let fallback: Arc<dyn PdfFallbackConverter> = match &config.pdf_fallback {
            Some(f) => Arc::clone(f),
            None => Arc::new(PdfiumLayoutConverter::new(
                config.fallback.clone(),
                config.progress_callback.clone(),
            )),
        };
        let ocr: Arc<dyn OcrEngine> = match &config.ocr_engine {
            Some(o) => Arc::clone(o),
            None => Arc::new(OcrMyPdf::new(&config.ocr.program)),
        };
        Self {
            primary,
            fallback,
            ocr,
        }
    }
}

/// Convert every pending file under `config.root`.
///
/// # Returns
/// `Ok(BatchSummary)` once every candidate has been attempted, even if some
/// (or all) files failed; per-file failures are listed in `summary.failed`.
///
/// # Errors
/// Returns `Err(Docs2MdError)` only for fatal errors:
/// - Root directory missing
/// - Output folders cannot be created
/// - A directory cannot be listed
/// - History file unreadable, or the final save fails
pub async fn convert_directory(config: &BatchConfig) -> Result<BatchSummary, Docs2MdError> {
    let start = Instant::now();
    let root = config.root.clone();
    if !root.is_dir() {
        return Err(Docs2MdError::RootNotFound { path: root });
    }
    info!("Starting batch: {}", root.display());

    // ── Step 1: Output folders ───────────────────────────────────────────
    let layout = config.layout();
    for dir in [layout.md_dir(), layout.ocr_dir()] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| Docs2MdError::CreateDirFailed {
                path: dir.to_path_buf(),
                source,
            })?;
    }

    // ── Step 2: History ──────────────────────────────────────────────────
    let history = HistoryStore::new(config.history_file());
    let mut processed = history.load()?;
    debug!("{} paths already in history", processed.len());

    // ── Step 3: Walk ─────────────────────────────────────────────────────
    let walker = DirectoryWalker::from_config(config);
    let snapshot = processed.clone();
    let report = tokio::task::spawn_blocking(move || walker.walk(&snapshot))
        .await
        .map_err(|e| Docs2MdError::Internal(format!("Walk task panicked: {}", e)))??;

    let mut summary = BatchSummary {
        root: root.clone(),
        history_path: history.path().to_path_buf(),
        discovered: report.candidates.len(),
        already_processed: report.already_processed,
        ..BatchSummary::default()
    };

    // ── Step 4: Claim output names ───────────────────────────────────────
    // History entries keep their names even though they are not walked again.
    let (candidates, collisions) = claim_output_names(&processed, report.candidates);

    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(candidates.len(), summary.already_processed);
    }
    info!(
        "{} files to convert, {} already processed",
        candidates.len(),
        summary.already_processed
    );

    for failed in collisions {
        warn!("Skipping '{}': {}", failed.rel_path, failed.reason);
        if let Some(ref cb) = config.progress_callback {
            cb.on_file_failed(&failed.rel_path, &failed.reason);
        }
        summary.failed.push(failed);
    }

    // ── Step 5: Convert through the bounded pool ─────────────────────────
    let engines = Engines::resolve(config);
    let layout_ref = &layout;
    let engines_ref = &engines;
    let mut results = stream::iter(candidates.into_iter().map(|candidate| async move {
        process_file(&candidate, engines_ref, layout_ref, config).await
    }))
    .buffer_unordered(config.concurrency.max(1));

    // Single writer: only this loop touches the history file.
    while let Some(outcome) = results.next().await {
        if outcome.is_converted() {
            let rel_path = outcome.rel_path().to_string();
            if let Err(e) = history.append(&rel_path) {
                warn!("{}", e);
            }
            processed.insert(rel_path);
        }
        summary.record(outcome);
    }

    // ── Step 6: Persist the union ────────────────────────────────────────
    history.save(&processed)?;

    summary.duration_ms = start.elapsed().as_millis() as u64;
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(summary.converted.len(), summary.failed.len());
    }
    info!(
        "Batch complete: {} converted ({} via OCR), {} failed, {}ms",
        summary.converted.len(),
        summary.ocr_count(),
        summary.failed.len(),
        summary.duration_ms
    );

    Ok(summary)
}

/// Synchronous wrapper around [`convert_directory`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_directory_sync(config: &BatchConfig) -> Result<BatchSummary, Docs2MdError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Docs2MdError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert_directory(config))
}

/// Run the fallback chain for one file and write its output.
///
/// Does not touch history; the caller records converted paths. Engines are
/// resolved on every call, so batches should go through [`convert_directory`].
pub async fn convert_file(candidate: &CandidateFile, config: &BatchConfig) -> FileOutcome {
    let engines = Engines::resolve(config);
    let layout = config.layout();
    process_file(candidate, &engines, &layout, config).await
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Keep the first owner of each flattened output name.
///
/// Paths already in history own their names before any candidate is seen.
fn claim_output_names(
    processed: &ProcessedSet,
    candidates: Vec<CandidateFile>,
) -> (Vec<CandidateFile>, Vec<FailedFile>) {
    let mut claimed: HashMap<String, String> = processed
        .iter()
        .map(|p| (markdown_file_name(p), p.clone()))
        .collect();
    let mut accepted = Vec::with_capacity(candidates.len());
    let mut collisions = Vec::new();

    for candidate in candidates {
        let name = markdown_file_name(&candidate.rel_path);
        match claimed.get(&name) {
            Some(owner) => collisions.push(FailedFile {
                rel_path: candidate.rel_path,
                reason: FailureReason::OutputCollision {
                    claimed_by: owner.clone(),
                },
            }),
            None => {
                claimed.insert(name, candidate.rel_path.clone());
                accepted.push(candidate);
            }
        }
    }

    (accepted, collisions)
}

async fn process_file(
    candidate: &CandidateFile,
    engines: &Engines,
    layout: &OutputLayout,
    config: &BatchConfig,
) -> FileOutcome {
    let rel_path = candidate.rel_path.clone();
    if let Some(ref cb) = config.progress_callback {
        cb.on_file_start(&rel_path);
    }

    let output_path = layout.markdown_path(&rel_path);
    let outcome = match run_chain(candidate, engines, layout, &config.ocr).await {
        Ok(result) => match write_output(&output_path, &result.markdown).await {
            Ok(()) => {
                log_converted(candidate, &output_path, &result);
                if let Some(ref cb) = config.progress_callback {
                    cb.on_file_converted(&rel_path, &result);
                }
                FileOutcome::Converted(ConvertedFile {
                    rel_path,
                    output_path,
                    strategy: result.strategy,
                    ocr_used: result.ocr_used(),
                    markdown_len: result.markdown.len(),
                })
            }
            Err(e) => {
                warn!("Failed to write '{}': {}", output_path.display(), e);
                FileOutcome::Failed(FailedFile {
                    rel_path,
                    reason: FailureReason::WriteFailed {
                        path: output_path,
                        detail: e.to_string(),
                    },
                })
            }
        },
        Err(reason) => {
            debug!("No markdown output generated for '{}': {}", candidate.path.display(), reason);
            FileOutcome::Failed(FailedFile { rel_path, reason })
        }
    };

    if let (FileOutcome::Failed(f), Some(cb)) = (&outcome, config.progress_callback.as_ref()) {
        cb.on_file_failed(&f.rel_path, &f.reason);
    }
    outcome
}

/// Attempt strategies in order until one produces Markdown.
async fn run_chain(
    candidate: &CandidateFile,
    engines: &Engines,
    layout: &OutputLayout,
    ocr_settings: &OcrSettings,
) -> Result<ConversionResult, FailureReason> {
    let source = candidate.path.as_path();
    let converted = |markdown, strategy| Ok(ConversionResult { markdown, strategy });

    // ── PRIMARY ──────────────────────────────────────────────────────────
    match primary_outcome(engines, source).await {
        StrategyOutcome::Converted(md) => return converted(md, Strategy::Primary),
        StrategyOutcome::Empty => debug!("Primary conversion empty for '{}'", source.display()),
        StrategyOutcome::Failed(e) => log_strategy_error("Error processing", source, &e),
    }

    if !candidate.is_pdf() {
        return Err(FailureReason::NoOutput {
            ocr_attempted: false,
        });
    }

    // ── FALLBACK_PDF ─────────────────────────────────────────────────────
    let output_path = layout.markdown_path(&candidate.rel_path);
    if tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
        debug!(
            "Skipping fallback for '{}' because '{}' already exists.",
            source.display(),
            output_path.display()
        );
    } else {
        match fallback_outcome(engines, source).await {
            StrategyOutcome::Converted(md) => return converted(md, Strategy::Fallback),
            StrategyOutcome::Empty => debug!(
                "Fallback PDF conversion did not produce output for '{}'",
                source.display()
            ),
            StrategyOutcome::Failed(e) => {
                log_strategy_error("Fallback PDF conversion failed for", source, &e)
            }
        }
    }

    // ── OCR ──────────────────────────────────────────────────────────────
    let ocr_path = layout.ocr_path(&candidate.rel_path);
    debug!("Running OCR on '{}' -> '{}'", source.display(), ocr_path.display());
    if let Err(e) = run_ocr(engines, source, &ocr_path, ocr_settings).await {
        log_strategy_error("OCR failed for", source, &e);
        debug!("Skipping OCR conversion for '{}' due to OCR failure.", source.display());
        return Err(FailureReason::OcrFailed { error: e });
    }

    // ── OCR_PRIMARY ──────────────────────────────────────────────────────
    match primary_outcome(engines, &ocr_path).await {
        StrategyOutcome::Converted(md) => return converted(md, Strategy::OcrPrimary),
        StrategyOutcome::Empty => debug!("Primary conversion empty for OCR output '{}'", ocr_path.display()),
        StrategyOutcome::Failed(e) => log_strategy_error("Error processing OCR output", &ocr_path, &e),
    }

    // ── OCR_FALLBACK ─────────────────────────────────────────────────────
    match fallback_outcome(engines, &ocr_path).await {
        StrategyOutcome::Converted(md) => converted(md, Strategy::OcrFallback),
        StrategyOutcome::Empty => {
            debug!(
                "Fallback PDF conversion did not produce output for OCR file '{}'",
                ocr_path.display()
            );
            Err(FailureReason::NoOutput { ocr_attempted: true })
        }
        StrategyOutcome::Failed(e) => {
            log_strategy_error("Fallback PDF conversion failed for", &ocr_path, &e);
            Err(FailureReason::NoOutput { ocr_attempted: true })
        }
    }
}

async fn primary_outcome(engines: &Engines, path: &Path) -> StrategyOutcome {
    let result = engines.primary.convert(path).await.map(|out| out.into_markdown());
    StrategyOutcome::from_result(result)
}

async fn fallback_outcome(engines: &Engines, path: &Path) -> StrategyOutcome {
    StrategyOutcome::from_result(engines.fallback.convert(path).await)
}

/// Invoke the OCR engine and confirm the artifact exists.
async fn run_ocr(
    engines: &Engines,
    source: &Path,
    ocr_path: &Path,
    settings: &OcrSettings,
) -> Result<(), StrategyError> {
    if let Some(parent) = ocr_path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| StrategyError::io(parent, &e))?;
    }
    engines.ocr.ocr(source, ocr_path, settings).await?;
    if !tokio::fs::try_exists(ocr_path).await.unwrap_or(false) {
        return Err(StrategyError::OutputMissing {
            path: ocr_path.to_path_buf(),
        });
    }
    Ok(())
}

/// Atomic write: temp file next to the target, then rename.
async fn write_output(path: &Path, markdown: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp_path = path.with_extension("md.tmp");
    tokio::fs::write(&tmp_path, markdown).await?;
    tokio::fs::rename(&tmp_path, path).await
}

fn log_strategy_error(context: &str, path: &Path, error: &StrategyError) {
    warn!("{} '{}': {}: {}", context, path.display(), error.kind(), error);
    debug!("{:#?}", error);
}

fn log_converted(candidate: &CandidateFile, output_path: &Path, result: &ConversionResult) {
    let (input, output) = (candidate.path.display(), output_path.display());
    match result.strategy {
        Strategy::Primary => debug!("Converted '{}' to '{}'", input, output),
        Strategy::Fallback => debug!("Converted '{}' using PDF fallback to '{}'", input, output),
        Strategy::OcrPrimary | Strategy::OcrFallback => {
            debug!("Converted '{}' after OCR to '{}' ({})", input, output, result.strategy)
        }
    }
}
