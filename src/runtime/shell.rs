//! External command execution.
//!
//! Commands always receive their working directory as an argument; the
//! process-wide current directory is never changed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of a finished command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    pub fn code_display(&self) -> String {
        self.code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "signal".to_string())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Shell: Send + Sync {
    /// Run `command` through the platform shell inside `cwd`, capturing output.
    async fn run(&self, command: &str, cwd: &Path) -> Result<ExecOutput>;
}

pub struct RealShell;

#[async_trait]
impl Shell for RealShell {
    #[tracing::instrument(skip(self))]
    async fn run(&self, command: &str, cwd: &Path) -> Result<ExecOutput> {
        debug!("Running `{}` in {:?}", command, cwd);
        let output = shell_command(command)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to start `{}` in {:?}", command, cwd))?;

        Ok(ExecOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Quote a path so it survives as one argument of a shell command line.
pub fn quote_path(path: &Path) -> String {
    let raw = path.to_string_lossy();
    #[cfg(unix)]
    {
        format!("'{}'", raw.replace('\'', r"'\''"))
    }
    #[cfg(windows)]
    {
        format!("\"{}\"", raw)
    }
}
