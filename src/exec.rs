//! External command execution.
//!
//! Every collaborator (package manager, build tool, service manager, VCS
//! client, kernel queries) is reached through the [`Executor`] trait so that
//! task logic can be exercised with a recording mock.
use anyhow::{Context, Result};
use std::process::{Command, Output};
use thiserror::Error;

/// Result of a command execution.
#[derive(Debug, Clone, Default)]
pub struct ExecResult {
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Exit status, or `None` if the command was killed by a signal.
    pub code: Option<i32>,
}

impl From<Output> for ExecResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        }
    }
}

/// A command ran but exited non-zero.
///
/// `code` is `-1` when the process was terminated by a signal.
#[derive(Error, Debug)]
#[error("{label} failed (exit {code}): {stderr}")]
pub struct CommandError {
    /// Command line that failed.
    pub label: String,
    /// Exit status.
    pub code: i32,
    /// Trimmed standard error.
    pub stderr: String,
}

/// Render a command line for logs and error messages.
#[must_use]
pub fn command_line(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Abstraction over running external programs.
pub trait Executor: Send + Sync {
    /// Run a command and return its output. Fails if the command exits non-zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the program cannot be spawned, or a
    /// [`CommandError`] if it exits non-zero.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Run a command, allowing failure (returns result without bailing).
    ///
    /// # Errors
    ///
    /// Returns an error only if the program cannot be spawned.
    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult>;

    /// Check if a program is available on PATH.
    fn which(&self, program: &str) -> bool;
}

/// Production [`Executor`] backed by [`std::process::Command`].
///
/// Commands inherit the process working directory, which build actions set
/// through [`WorkdirGuard`](crate::tasks::workdir::WorkdirGuard).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let label = command_line(program, args);
        let result = self.run_unchecked(program, args)?;
        if !result.success {
            return Err(CommandError {
                label,
                code: result.code.unwrap_or(-1),
                stderr: result.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(result)
    }

    fn run_unchecked(&self, program: &str, args: &[&str]) -> Result<ExecResult> {
        let output = Command::new(program)
            .args(args)
            .output()
            .with_context(|| format!("failed to execute: {program}"))?;
        Ok(ExecResult::from(output))
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}
