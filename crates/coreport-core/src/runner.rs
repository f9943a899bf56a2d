use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::{PortError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Runs external programs synchronously. Implemented by [`SystemRunner`] and
/// by fakes in tests.
pub trait CommandRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<CommandOutput>;

    /// Like [`CommandRunner::run`], but a non-zero exit is an error.
    fn run_checked(&self, dir: &Path, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let output = self.run(dir, program, args)?;
        if !output.success() {
            let detail = if output.stderr.trim().is_empty() {
                output.stdout.trim()
            } else {
                output.stderr.trim()
            };
            return Err(PortError::Command {
                command: display_command(program, args),
                message: format!("exit status {:?}: {}", output.code, detail),
            });
        }
        Ok(output)
    }
}

pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, dir: &Path, program: &str, args: &[&str]) -> Result<CommandOutput> {
        debug!("Running `{}` in {:?}", display_command(program, args), dir);
        let output = Command::new(program)
            .args(args)
            .current_dir(dir)
            .output()
            .map_err(|e| PortError::Command {
                command: display_command(program, args),
                message: e.to_string(),
            })?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

pub(crate) fn display_command(program: &str, args: &[&str]) -> String {
    std::iter::once(program)
        .chain(args.iter().copied())
        .collect::<Vec<_>>()
        .join(" ")
}
