//! Running external conversion tools as subprocesses.

use crate::error::StrategyError;
use std::io::ErrorKind;
use tokio::process::Command;
use tracing::debug;

/// Longest stderr tail kept in a [`StrategyError::ProcessFailed`].
const MAX_STDERR_CHARS: usize = 600;

/// Run `cmd` to completion and return its stdout.
///
/// A missing executable maps to [`StrategyError::ToolNotFound`]; a non-zero
/// exit maps to [`StrategyError::ProcessFailed`] carrying the end of stderr.
pub async fn run_tool(tool: &str, mut cmd: Command) -> Result<Vec<u8>, StrategyError> {
    cmd.kill_on_drop(true);
    debug!("Running {:?}", cmd.as_std());

    let output = cmd.output().await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => StrategyError::ToolNotFound {
            tool: tool.to_string(),
        },
        _ => StrategyError::ProcessFailed {
            tool: tool.to_string(),
            status: "spawn failed".to_string(),
            stderr: e.to_string(),
        },
    })?;

    if !output.status.success() {
        return Err(StrategyError::ProcessFailed {
            tool: tool.to_string(),
            status: output.status.to_string(),
            stderr: stderr_tail(&output.stderr),
        });
    }

    Ok(output.stdout)
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= MAX_STDERR_CHARS {
        text.to_string()
    } else {
        let tail: String = text.chars().skip(count - MAX_STDERR_CHARS).collect();
        format!("\u{2026}{tail}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_tool_not_found() {
        let cmd = Command::new("docs2md-test-no-such-tool");
        let err = run_tool("docs2md-test-no-such-tool", cmd).await.unwrap_err();
        assert!(matches!(err, StrategyError::ToolNotFound { .. }), "got: {err:?}");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_keeps_stderr() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("echo broken input >&2; exit 3");
        let err = run_tool("sh", cmd).await.unwrap_err();
        match err {
            StrategyError::ProcessFailed { stderr, .. } => assert_eq!(stderr, "broken input"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn success_returns_stdout() {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg("printf '# Title'");
        let out = run_tool("sh", cmd).await.unwrap();
        assert_eq!(out, b"# Title");
    }

    #[test]
    fn long_stderr_is_truncated_from_the_front() {
        let long = "x".repeat(MAX_STDERR_CHARS + 50) + "END";
        let tail = stderr_tail(long.as_bytes());
        assert!(tail.ends_with("END"));
        assert!(tail.starts_with('\u{2026}'));
        assert_eq!(tail.chars().count(), MAX_STDERR_CHARS + 1);
    }
}
