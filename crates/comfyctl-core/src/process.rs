#![deny(clippy::all, warnings)]

use std::os::unix::process::{CommandExt, ExitStatusExt};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

use crate::issues::LifecycleIssue;

/// How a child process ended: an exit code, or the signal that killed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutput {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl RunOutput {
    #[must_use]
    pub const fn exited(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    #[must_use]
    pub const fn killed(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    #[must_use]
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Locates `program` the way the shell would, so a missing tool is reported
/// before anything is spawned.
///
/// # Errors
///
/// Returns [`LifecycleIssue::ProgramNotFound`] when the program is not on `PATH`.
pub fn resolve_program(program: &str) -> Result<PathBuf> {
    which::which(program).map_err(|_| {
        LifecycleIssue::ProgramNotFound {
            program: program.to_string(),
        }
        .into()
    })
}

/// Execute a program with inherited stdio and wait for it to exit.
///
/// # Errors
///
/// Returns an error when the program cannot be found or spawned.
pub fn run_command_passthrough(program: &str, args: &[String]) -> Result<RunOutput> {
    let resolved = resolve_program(program)?;
    let status = Command::new(&resolved)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("failed to start {program}"))?;
    Ok(RunOutput {
        code: status.code(),
        signal: status.signal(),
    })
}

/// Replace the current process image with `program`, keeping stdio and the
/// pid. Only returns when the program cannot be found or executed.
///
/// # Errors
///
/// Always returns the reason the exec did not happen.
pub fn exec_command(program: &str, args: &[String]) -> Result<()> {
    let resolved = resolve_program(program)?;
    let err = Command::new(&resolved).args(args).exec();
    Err(err).with_context(|| format!("failed to exec {program}"))
}
