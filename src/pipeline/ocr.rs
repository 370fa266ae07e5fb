//! OCR engine: rasterise a scanned PDF and embed a recognised text layer.
//!
//! The default adapter, [`OcrMyPdf`], runs the `ocrmypdf` command, which
//! writes a new searchable PDF at the requested output path. The output's
//! parent directory must exist before the call; the pipeline creates it.

use crate::config::OcrSettings;
use crate::error::StrategyError;
use crate::pipeline::tool::run_tool;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// Optical character recognition engine producing a new PDF.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    fn name(&self) -> &str;

    /// Recognise `input` and write the OCR'd PDF to `output`.
    async fn ocr(
        &self,
        input: &Path,
        output: &Path,
        settings: &OcrSettings,
    ) -> Result<(), StrategyError>;
}

/// Runs the `ocrmypdf` CLI.
#[derive(Debug, Clone)]
pub struct OcrMyPdf {
    program: String,
}

impl OcrMyPdf {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, input: &Path, output: &Path, settings: &OcrSettings) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("--language").arg(settings.language_arg());
        if settings.force_ocr {
            cmd.arg("--force-ocr");
        }
        if !settings.progress_bar {
            cmd.arg("--no-progress-bar");
        }
        cmd.arg(input).arg(output);
        cmd
    }
}

impl Default for OcrMyPdf {
    fn default() -> Self {
        Self::new("ocrmypdf")
    }
}

#[async_trait]
impl OcrEngine for OcrMyPdf {
    fn name(&self) -> &str {
        "ocrmypdf"
    }

    async fn ocr(
        &self,
        input: &Path,
        output: &Path,
        settings: &OcrSettings,
    ) -> Result<(), StrategyError> {
        run_tool(&self.program, self.command(input, output, settings)).await?;
        Ok(())
    }
}
