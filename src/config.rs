//! Configuration types for batch directory conversion.
//!
//! All batch behaviour is controlled through [`BatchConfig`], built via its
//! [`BatchConfigBuilder`]. The three conversion engines can be injected as
//! trait objects; when they are not, the default adapters
//! ([`MarkitdownCli`](crate::pipeline::primary::MarkitdownCli),
//! [`PdfiumLayoutConverter`](crate::pipeline::fallback::PdfiumLayoutConverter),
//! [`OcrMyPdf`](crate::pipeline::ocr::OcrMyPdf)) are built from the
//! settings below.

use crate::error::Docs2MdError;
use crate::layout::OutputLayout;
use crate::pipeline::fallback::PdfFallbackConverter;
use crate::pipeline::ocr::OcrEngine;
use crate::pipeline::primary::PrimaryConverter;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default history file name, created inside the processing root.
pub const HISTORY_FILE: &str = ".markitdown_history";

/// Folder (under the root) receiving flattened Markdown output.
pub const MD_FOLDER: &str = "MD_Folder";

/// Folder (under the root) receiving OCR'd PDFs.
pub const OCR_FOLDER: &str = "OCR";

/// Recognition languages applied to every OCR call.
pub const DEFAULT_OCR_LANGUAGES: &[&str] = &["eng", "chi_sim", "chi_tra", "nld", "spa", "tur"];

/// Heading placed above each table emitted by the fallback converter.
pub const DEFAULT_TABLE_HEADER: &str = "### Table";

/// Settings passed to the OCR engine on every invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Executable used by the default OCR adapter. Default: `ocrmypdf`.
    pub program: String,
    /// Tesseract language codes. Default: [`DEFAULT_OCR_LANGUAGES`].
    pub languages: Vec<String>,
    /// Rasterise and re-recognise every page even if it already has text. Default: true.
    pub force_ocr: bool,
    /// Render the engine's own progress bar. Default: false.
    pub progress_bar: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            program: "ocrmypdf".to_string(),
            languages: DEFAULT_OCR_LANGUAGES.iter().map(|s| s.to_string()).collect(),
            force_ocr: true,
            progress_bar: false,
        }
    }
}

impl OcrSettings {
    /// Languages in Tesseract's `a+b+c` form.
    pub fn language_arg(&self) -> String {
        self.languages.join("+")
    }
}

/// Options for the fallback PDF converter's Markdown shaping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackOptions {
    /// Strip lines repeated at the top of most pages. Default: false.
    pub remove_headers: bool,
    /// Do not emit tables that have a header row but no body. Default: true.
    pub skip_empty_tables: bool,
    /// Heading line written above each table. Default: `### Table`.
    pub table_header: String,
}

impl Default for FallbackOptions {
    fn default() -> Self {
        Self {
            remove_headers: false,
            skip_empty_tables: true,
            table_header: DEFAULT_TABLE_HEADER.to_string(),
        }
    }
}

/// Configuration for one batch run over a directory tree.
///
/// # Example
/// ```rust
/// use edgequake_docs2md::BatchConfig;
///
/// let config = BatchConfig::builder("./documents")
///     .concurrency(4)
///     .history_path("/var/lib/docs2md/history")
///     .build()
///     .unwrap();
/// assert_eq!(config.concurrency, 4);
/// ```
#[derive(Clone)]
pub struct BatchConfig {
    /// Root directory to process.
    pub root: PathBuf,

    /// History file location. If None, `<root>/.markitdown_history`.
    pub history_path: Option<PathBuf>,

    /// Markdown output folder name under the root. Default: `MD_Folder`.
    pub md_folder: String,

    /// OCR artifact folder name under the root. Default: `OCR`.
    pub ocr_folder: String,

    /// Files converted at once. Default: 1 (strictly sequential).
    ///
    /// Each file's whole fallback chain runs as one unit of work; history
    /// writes stay on a single task regardless of this value.
    pub concurrency: usize,

    /// Executable used by the default primary converter. Default: `markitdown`.
    pub markitdown_program: String,

    /// OCR invocation settings.
    pub ocr: OcrSettings,

    /// Fallback PDF converter options.
    pub fallback: FallbackOptions,

    /// Pre-constructed primary converter. Takes precedence over `markitdown_program`.
    pub primary: Option<Arc<dyn PrimaryConverter>>,

    /// Pre-constructed fallback PDF converter. Takes precedence over `fallback`.
    pub pdf_fallback: Option<Arc<dyn PdfFallbackConverter>>,

    /// Pre-constructed OCR engine. Takes precedence over `ocr.program`.
    pub ocr_engine: Option<Arc<dyn OcrEngine>>,

    /// Optional progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            history_path: None,
            md_folder: MD_FOLDER.to_string(),
            ocr_folder: OCR_FOLDER.to_string(),
            concurrency: 1,
            markitdown_program: "markitdown".to_string(),
            ocr: OcrSettings::default(),
            fallback: FallbackOptions::default(),
            primary: None,
            pdf_fallback: None,
            ocr_engine: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchConfig")
            .field("root", &self.root)
            .field("history_path", &self.history_path)
            .field("md_folder", &self.md_folder)
            .field("ocr_folder", &self.ocr_folder)
            .field("concurrency", &self.concurrency)
            .field("markitdown_program", &self.markitdown_program)
            .field("ocr", &self.ocr)
            .field("fallback", &self.fallback)
            .field("primary", &self.primary.as_ref().map(|p| p.name().to_string()))
            .field(
                "pdf_fallback",
                &self.pdf_fallback.as_ref().map(|p| p.name().to_string()),
            )
            .field("ocr_engine", &self.ocr_engine.as_ref().map(|p| p.name().to_string()))
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl BatchConfig {
    /// Create a new builder for a run over `root`.
    pub fn builder(root: impl Into<PathBuf>) -> BatchConfigBuilder {
        BatchConfigBuilder {
            config: Self {
                root: root.into(),
                ..Self::default()
            },
        }
    }

    /// Resolved history file path.
    pub fn history_file(&self) -> PathBuf {
        self.history_path
            .clone()
            .unwrap_or_else(|| self.root.join(HISTORY_FILE))
    }

    /// Output folders resolved against the root.
    pub fn layout(&self) -> OutputLayout {
        OutputLayout::new(&self.root, &self.md_folder, &self.ocr_folder)
    }
}

/// Builder for [`BatchConfig`].
#[derive(Debug)]
pub struct BatchConfigBuilder {
    config: BatchConfig,
}

impl BatchConfigBuilder {
    pub fn history_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.history_path = Some(path.into());
        self
    }

    pub fn md_folder(mut self, name: impl Into<String>) -> Self {
        self.config.md_folder = name.into();
        self
    }

    pub fn ocr_folder(mut self, name: impl Into<String>) -> Self {
        self.config.ocr_folder = name.into();
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn markitdown_program(mut self, program: impl Into<String>) -> Self {
        self.config.markitdown_program = program.into();
        self
    }

    pub fn ocr_program(mut self, program: impl Into<String>) -> Self {
        self.config.ocr.program = program.into();
        self
    }

    pub fn ocr_languages<I, S>(mut self, languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.ocr.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn fallback_options(mut self, options: FallbackOptions) -> Self {
        self.config.fallback = options;
        self
    }

    pub fn primary(mut self, converter: Arc<dyn PrimaryConverter>) -> Self {
        self.config.primary = Some(converter);
        self
    }

    pub fn pdf_fallback(mut self, converter: Arc<dyn PdfFallbackConverter>) -> Self {
        self.config.pdf_fallback = Some(converter);
        self
    }

    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.config.ocr_engine = Some(engine);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<BatchConfig, Docs2MdError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Docs2MdError::InvalidConfig("Concurrency must be ≥ 1".into()));
        }
        validate_folder_name("md_folder", &c.md_folder)?;
        validate_folder_name("ocr_folder", &c.ocr_folder)?;
        if c.md_folder == c.ocr_folder {
            return Err(Docs2MdError::InvalidConfig(format!(
                "md_folder and ocr_folder must differ, both are '{}'",
                c.md_folder
            )));
        }
        if c.fallback.table_header.trim().is_empty() {
            return Err(Docs2MdError::InvalidConfig(
                "table_header must not be empty".into(),
            ));
        }
        if c.ocr.languages.is_empty()
            || c.ocr
                .languages
                .iter()
                .any(|l| l.trim().is_empty() || l.contains('+'))
        {
            return Err(Docs2MdError::InvalidConfig(format!(
                "OCR languages must be non-empty codes, got {:?}",
                c.ocr.languages
            )));
        }
        Ok(self.config)
    }
}

/// Folder names must be a single normal path component.
fn validate_folder_name(field: &str, name: &str) -> Result<(), Docs2MdError> {
    let ok = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && Path::new(name).file_name().is_some();
    if ok {
        Ok(())
    } else {
        Err(Docs2MdError::InvalidConfig(format!(
            "{field} must be a plain folder name, got '{name}'"
        )))
    }
}
