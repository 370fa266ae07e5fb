//! Primary converter: generic any-format → Markdown.
//!
//! The first strategy tried for every file. The default adapter,
//! [`MarkitdownCli`], shells out to the `markitdown` command, which prints the
//! converted Markdown on stdout and exits non-zero for unsupported or corrupt
//! input.

use crate::error::StrategyError;
use crate::pipeline::tool::run_tool;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

/// What a primary conversion returns.
///
/// Mirrors converters that expose both a Markdown rendering and a plain-text
/// rendering; either may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimaryOutput {
    pub markdown: Option<String>,
    pub text_content: Option<String>,
}

impl PrimaryOutput {
    pub fn from_markdown(markdown: impl Into<String>) -> Self {
        Self {
            markdown: Some(markdown.into()),
            text_content: None,
        }
    }

    /// `markdown` when non-empty, else `text_content` when non-empty, else "".
    pub fn into_markdown(self) -> String {
        match (self.markdown, self.text_content) {
            (Some(md), _) if !md.is_empty() => md,
            (_, Some(text)) if !text.is_empty() => text,
            _ => String::new(),
        }
    }
}

/// Generic document → Markdown engine.
#[async_trait]
pub trait PrimaryConverter: Send + Sync {
    fn name(&self) -> &str;
    async fn convert(&self, path: &Path) -> Result<PrimaryOutput, StrategyError>;
}

/// Runs the `markitdown` CLI on each file.
#[derive(Debug, Clone)]
pub struct MarkitdownCli {
    program: String,
}

impl MarkitdownCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(path);
        cmd
    }
}

impl Default for MarkitdownCli {
    fn default() -> Self {
        Self::new("markitdown")
    }
}

#[async_trait]
impl PrimaryConverter for MarkitdownCli {
    fn name(&self) -> &str {
        "markitdown"
    }

    async fn convert(&self, path: &Path) -> Result<PrimaryOutput, StrategyError> {
        let stdout = run_tool(&self.program, self.command(path)).await?;
        let markdown = String::from_utf8(stdout).map_err(|e| StrategyError::InvalidOutput {
            tool: self.program.clone(),
            detail: e.to_string(),
        })?;
        Ok(PrimaryOutput::from_markdown(markdown))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_wins_when_present() {
        let out = PrimaryOutput {
            markdown: Some("# md".into()),
            text_content: Some("text".into()),
        };
        assert_eq!(out.into_markdown(), "# md");
    }

    #[test]
    fn text_content_used_when_markdown_empty() {
        let out = PrimaryOutput {
            markdown: Some(String::new()),
            text_content: Some("text".into()),
        };
        assert_eq!(out.into_markdown(), "text");

        let out = PrimaryOutput {
            markdown: None,
            text_content: Some("text".into()),
        };
        assert_eq!(out.into_markdown(), "text");
    }

    #[test]
    fn both_empty_is_empty() {
        assert_eq!(PrimaryOutput::default().into_markdown(), "");
    }

    #[test]
    fn command_passes_path_as_single_argument() {
        let cli = MarkitdownCli::new("markitdown");
        let cmd = cli.command(Path::new("/data/a b/report.docx"));
        let args: Vec<_> = cmd.as_std().get_args().collect();
        assert_eq!(args, vec![std::ffi::OsStr::new("/data/a b/report.docx")]);
        assert_eq!(cmd.as_std().get_program(), "markitdown");
    }

    #[tokio::test]
    async fn missing_markitdown_is_reported() {
        let cli = MarkitdownCli::new("docs2md-test-no-markitdown");
        let err = cli.convert(Path::new("x.docx")).await.unwrap_err();
        assert_eq!(err.kind(), "ToolNotFound");
    }
}
