//! Command runner abstraction used by the SSH transport.

use std::ffi::OsString;
use std::process::{Command, Stdio};

use thiserror::Error;

/// Errors raised while running an external command.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum CommandError {
    /// The program could not be started.
    #[error("failed to spawn `{program}`: {message}")]
    Spawn {
        /// Program that failed to start.
        program: String,
        /// Operating system error message.
        message: String,
    },
}

/// Result of running an external command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandOutput {
    /// Exit code reported by the process, if available.
    pub code: Option<i32>,
    /// Captured standard output; empty when streamed.
    pub stdout: String,
    /// Captured standard error; empty when streamed.
    pub stderr: String,
}

impl CommandOutput {
    /// Returns `true` when the exit code equals zero.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Abstraction over command execution to support fakes in tests.
pub trait CommandRunner {
    /// Runs `program` with the given arguments.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Spawn`] if the command cannot be started.
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, CommandError>;
}

/// Runs commands and captures their output.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, CommandError> {
        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|err| spawn_error(program, &err))?;

        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Runs commands attached to the caller's terminal.
///
/// Standard input, output and error are inherited so interactive sessions
/// behave as if `ssh` had been called directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct StreamingCommandRunner;

impl CommandRunner for StreamingCommandRunner {
    fn run(&self, program: &str, args: &[OsString]) -> Result<CommandOutput, CommandError> {
        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|err| spawn_error(program, &err))?;

        Ok(CommandOutput {
            code: status.code(),
            stdout: String::new(),
            stderr: String::new(),
        })
    }
}

fn spawn_error(program: &str, err: &std::io::Error) -> CommandError {
    CommandError::Spawn {
        program: program.to_owned(),
        message: err.to_string(),
    }
}
