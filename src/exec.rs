//! Shell command execution.
//!
//! [`ShellCommand`] runs a configured command through `sh -c`, collects
//! everything it writes to stdout and hands it back with one trailing
//! newline removed.  It is the [`Sampler`] behind every bar and weather
//! item.
//!
//! There is no timeout.  A command that never exits blocks only the poller
//! that runs it.

use crate::traits::Sampler;
use log::debug;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Why a sample produced no text.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("failed to spawn {shell}: {source}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to collect output: {0}")]
    Read(#[source] std::io::Error),
    #[error("command produced no output")]
    Empty,
}

/// A shell command line, run synchronously on every sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    shell: PathBuf,
    command: String,
}

impl ShellCommand {
    /// Wrap `command` to be run by `sh -c`.
    pub fn new(command: impl Into<String>) -> Self {
        Self::with_shell("sh", command)
    }

    /// Wrap `command` to be run by `<shell> -c`.
    pub fn with_shell(shell: impl AsRef<Path>, command: impl Into<String>) -> Self {
        Self {
            shell: shell.as_ref().to_path_buf(),
            command: command.into(),
        }
    }

    /// The command line as configured.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Run the command to completion and return its stdout.
    ///
    /// Stdout is read until EOF into a growing buffer, decoded lossily as
    /// UTF-8 and stripped of at most one trailing `\n`.  Stderr is passed
    /// through to ours.  A non-zero exit status does not discard the output.
    pub fn run(&self) -> Result<String, SampleError> {
        let mut child = Command::new(&self.shell)
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| SampleError::Spawn {
                shell: self.shell.display().to_string(),
                source,
            })?;

        let mut buf = Vec::new();
        let read = match child.stdout.take() {
            Some(mut stdout) => stdout.read_to_end(&mut buf).map(|_| ()),
            None => Ok(()),
        };
        // Always reap the child, even when reading failed.
        let status = child.wait().map_err(SampleError::Read)?;
        read.map_err(SampleError::Read)?;

        if !status.success() {
            debug!("`{}` exited with {}", self.command, status);
        }

        let text = strip_trailing_newline(String::from_utf8_lossy(&buf).into_owned());
        if text.is_empty() {
            return Err(SampleError::Empty);
        }
        Ok(text)
    }
}

impl Sampler for ShellCommand {
    fn sample(&self) -> Result<String, SampleError> {
        self.run()
    }
}

/// Remove at most one trailing `\n`.
pub fn strip_trailing_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
    }
    text
}

//  Tests
