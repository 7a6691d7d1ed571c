//! Logged external command execution
//!
//! Providers and the bundle fetcher drive external CLIs (`kubectl`, `oc`,
//! `docker`). All of them go through `run_command` so every invocation is
//! logged the same way and dry-run is honoured in one place.

use std::ffi::OsStr;
use std::process::{Command, Stdio};

/// Execute `program` with `args`, capturing its output.
///
/// Under `dry_run` nothing is spawned; the command is logged and reported as
/// a successful run with empty output.
pub fn run_command<S: AsRef<OsStr>>(
    program: S,
    args: &[String],
    dry_run: bool,
) -> std::io::Result<CommandOutput> {
    let program = program.as_ref();
    let line = command_line(program, args);

    if dry_run {
        tracing::info!("DRY-RUN: {}", line);
        return Ok(CommandOutput::dry_run());
    }

    tracing::info!("Running: {}", line);
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    let result = CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code(),
        success: output.status.success(),
    };

    if result.success {
        tracing::debug!("{} succeeded", line);
    } else {
        tracing::debug!(
            "{} failed with exit code {}",
            line,
            result.exit_code.unwrap_or(-1)
        );
    }
    Ok(result)
}

fn command_line(program: &OsStr, args: &[String]) -> String {
    let mut parts = vec![program.to_string_lossy().to_string()];
    parts.extend(args.iter().cloned());
    shell_words::join(parts)
}

/// Output from a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
    /// Exit code (None if terminated by signal or never spawned).
    pub exit_code: Option<i32>,
    /// Whether the command exited successfully (exit code 0).
    pub success: bool,
}

impl CommandOutput {
    fn dry_run() -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
            success: true,
        }
    }

    /// Turn a failed run into an error message naming `context`.
    pub fn ensure_success(&self, context: &str) -> Result<(), String> {
        if self.success {
            Ok(())
        } else {
            Err(format!(
                "{} failed (exit code {}): {}",
                context,
                self.exit_code.unwrap_or(-1),
                self.stderr.trim()
            ))
        }
    }
}
