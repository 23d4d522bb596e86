//! Centralized command execution.
//!
//! Every external tool this crate drives (debootstrap, gpg, chroot, tar,
//! curl, xz) goes through the [`Runner`] trait, so tests can substitute a
//! recording fake and return programmed exit codes. All invocations are
//! synchronous and blocking; there are no timeouts, so a hanging subprocess
//! hangs the whole invocation.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::Command;

/// Result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code, or -1 if the process was terminated by a signal.
    pub code: i32,
    /// Captured stdout as a string.
    pub stdout: String,
    /// Captured stderr as a string.
    pub stderr: String,
}

impl CommandResult {
    /// Returns true if the command exited with code 0.
    pub fn success(&self) -> bool {
        self.code == 0
    }

    /// Get stdout, trimmed of whitespace.
    pub fn stdout_trimmed(&self) -> &str {
        self.stdout.trim()
    }

    /// Get stderr, trimmed of whitespace.
    pub fn stderr_trimmed(&self) -> &str {
        self.stderr.trim()
    }
}

/// Seam for external process execution.
///
/// An `Err` means the process could not be spawned at all; a non-zero exit
/// is reported through [`CommandResult::code`] so callers can map it to
/// their own error taxonomy.
pub trait Runner {
    /// Run a program with arguments, optionally in a working directory,
    /// capturing its output.
    fn run_in(&self, program: &str, args: &[String], dir: Option<&Path>) -> Result<CommandResult>;

    /// Run a program with arguments in the current directory.
    fn run(&self, program: &str, args: &[String]) -> Result<CommandResult> {
        self.run_in(program, args, None)
    }
}

/// Runner backed by `std::process::Command`.
pub struct SystemRunner;

impl Runner for SystemRunner {
    fn run_in(&self, program: &str, args: &[String], dir: Option<&Path>) -> Result<CommandResult> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = dir {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute '{}'. Is it installed?", program))?;

        Ok(CommandResult {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Build an owned argument vector from string slices.
pub fn argv<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().map(|s| s.as_ref().to_string()).collect()
}
