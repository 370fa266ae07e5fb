//! CLI binary for edgequake-docs2md.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `BatchConfig` and prints a run summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_docs2md::{
    convert_directory, BatchConfig, BatchSummary, ConversionProgressCallback, ConversionResult,
    FailureReason, FallbackProgress, LoggingProgressCallback, ProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar over files, one log line per file.
/// Files may finish out of order when `--jobs` is above 1.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Print fallback phase lines as well as per-file results.
    verbose: bool,
    ocr: AtomicUsize,
}

impl CliProgressCallback {
    fn new(verbose: bool) -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(spinner_style);
        bar.set_prefix("Scanning");
        bar.set_message("Walking directory…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            verbose,
            ocr: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, total: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>4}/{len} files  \
             ⏱ {elapsed_precise}  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(total as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Converting");
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_files: usize, already_processed: usize) {
        self.activate_bar(total_files);
        self.bar.println(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(&format!("{total_files} files to convert")),
            dim(&format!("({already_processed} already processed)"))
        ));
    }

    fn on_file_start(&self, rel_path: &str) {
        self.bar.set_message(rel_path.to_string());
    }

    fn on_file_converted(&self, rel_path: &str, result: &ConversionResult) {
        if result.ocr_used() {
            self.ocr.fetch_add(1, Ordering::SeqCst);
        }
        self.bar.println(format!(
            "  {} {}  {}",
            green("✓"),
            rel_path,
            dim(&format!("{} · {} chars", result.strategy, result.markdown.len())),
        ));
        self.bar.inc(1);
    }

    fn on_file_failed(&self, rel_path: &str, reason: &FailureReason) {
        let msg = reason.to_string();
        let msg = if msg.chars().count() > 80 {
            format!("{}\u{2026}", msg.chars().take(79).collect::<String>())
        } else {
            msg
        };
        self.bar
            .println(format!("  {} {}  {}", red("✗"), rel_path, red(&msg)));
        // Collided files are never dispatched and are not in the bar length.
        if !matches!(reason, FailureReason::OutputCollision { .. }) {
            self.bar.inc(1);
        }
    }

    fn on_fallback_progress(&self, progress: &FallbackProgress) {
        if self.verbose {
            self.bar.println(dim(&progress.to_string()));
        }
    }

    fn on_batch_complete(&self, converted: usize, failed: usize) {
        self.bar.finish_and_clear();
        let ocr = self.ocr.load(Ordering::SeqCst);
        if failed == 0 {
            eprintln!(
                "{} {} files converted  {}",
                green("✔"),
                bold(&converted.to_string()),
                dim(&format!("({ocr} via OCR)"))
            );
        } else {
            eprintln!(
                "{} {} files converted  ({} failed)  {}",
                if converted == 0 { red("✘") } else { cyan("⚠") },
                bold(&converted.to_string()),
                red(&failed.to_string()),
                dim(&format!("({ocr} via OCR)"))
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert everything under a folder (resumable)
  docs2md ~/Documents/archive

  # Four files at a time, debug logs
  docs2md --jobs 4 --verbose ~/Documents/archive

  # Keep history outside the tree
  docs2md --history ~/.cache/archive.history ~/Documents/archive

  # Machine-readable summary
  docs2md --json ~/Documents/archive > summary.json

OUTPUT LAYOUT:
  <root>/MD_Folder/<dir__dir__stem>.md   one Markdown file per converted input
  <root>/OCR/<dir>/<stem>_ocr.pdf        OCR'd copies of scanned PDFs
  <root>/.markitdown_history             relative paths already converted

  Delete a line from the history file to reconvert that file on the next run.

ENVIRONMENT VARIABLES:
  DOCS2MD_MARKITDOWN_BIN  Primary converter executable (default: markitdown)
  DOCS2MD_OCRMYPDF_BIN    OCR executable (default: ocrmypdf)
  PDFIUM_LIB_PATH         Path to libpdfium for the PDF fallback
  RUST_LOG                Override the log filter
"#;

/// Batch-convert a directory tree of documents to Markdown.
#[derive(Parser, Debug)]
#[command(
    name = "docs2md",
    version,
    about = "Batch-convert a directory tree of documents to Markdown",
    long_about = "Recursively convert every document under DIRECTORY to Markdown using \
markitdown, with a pdfium text fallback and ocrmypdf for scanned PDFs. Converted files are \
recorded in a history file so interrupted runs resume where they stopped.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Root directory to process.
    directory: PathBuf,

    /// Enable DEBUG-level logs (per-strategy decisions, skips, fallback phases).
    #[arg(short, long, env = "DOCS2MD_VERBOSE")]
    verbose: bool,

    /// History file location [default: <DIRECTORY>/.markitdown_history].
    #[arg(long, env = "DOCS2MD_HISTORY")]
    history: Option<PathBuf>,

    /// Files converted concurrently.
    #[arg(short, long, env = "DOCS2MD_JOBS", default_value_t = 1)]
    jobs: usize,

    /// Primary converter executable.
    #[arg(long, env = "DOCS2MD_MARKITDOWN_BIN", default_value = "markitdown")]
    markitdown_bin: String,

    /// OCR executable.
    #[arg(long, env = "DOCS2MD_OCRMYPDF_BIN", default_value = "ocrmypdf")]
    ocrmypdf_bin: String,

    /// Print the run summary as JSON on stdout.
    #[arg(long, env = "DOCS2MD_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "DOCS2MD_NO_PROGRESS")]
    no_progress: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "DOCS2MD_QUIET")]
    quiet: bool,
}

/// How progress events reach the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProgressMode {
    /// indicatif bar; fallback phases printed through it with `--verbose`.
    Bar,
    /// No bar, but `--verbose`: fallback phases go to the log.
    Log,
    Silent,
}

impl ProgressMode {
    fn from_cli(cli: &Cli) -> Self {
        if !cli.quiet && !cli.no_progress && !cli.json {
            ProgressMode::Bar
        } else if cli.verbose {
            ProgressMode::Log
        } else {
            ProgressMode::Silent
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // With the bar active, only warnings reach the log; the bar prints
    // per-file results itself.
    let mode = ProgressMode::from_cli(&cli);
    let show_progress = mode == ProgressMode::Bar;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else if show_progress {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = match mode {
        ProgressMode::Bar => {
            let cb = CliProgressCallback::new(cli.verbose);
            Some(cb as Arc<dyn ConversionProgressCallback>)
        }
        ProgressMode::Log => Some(Arc::new(LoggingProgressCallback) as ProgressCallback),
        ProgressMode::Silent => None,
    };

    let config = build_config(&cli, progress_cb)?;

    // ── Run ──────────────────────────────────────────────────────────────
    let summary = convert_directory(&config).await?;

    if cli.json {
        let json = serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else if !cli.quiet && !show_progress {
        print_summary(&summary);
    }

    Ok(())
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<BatchConfig> {
    let mut builder = BatchConfig::builder(&cli.directory)
        .concurrency(cli.jobs)
        .markitdown_program(&cli.markitdown_bin)
        .ocr_program(&cli.ocrmypdf_bin);

    if let Some(ref history) = cli.history {
        builder = builder.history_path(history);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_summary(summary: &BatchSummary) {
    eprintln!(
        "Converted {} files in {}ms ({} via OCR, {} already processed)",
        summary.converted.len(),
        summary.duration_ms,
        summary.ocr_count(),
        summary.already_processed
    );
    if !summary.failed.is_empty() {
        eprintln!("  {} files failed:", summary.failed.len());
        for f in &summary.failed {
            eprintln!("    {}: {}", f.rel_path, f.reason);
        }
    }
}
