//! Transaction templates produced by an external program.

use std::{
    path::PathBuf,
    process::{Command, Stdio},
};

use bytes::Bytes;
use tracing::debug;

/// Produces the transaction template a client is built from.
pub trait TemplateSource: Send + Sync {
    /// Produces one template.
    fn produce(&self) -> Result<Bytes, TemplateError>;
}

/// Runs an external command and takes its full stdout as the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTemplate {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl Default for CommandTemplate {
    /// `cargo run --release programs/fibonacci.json main --no-broadcast`
    fn default() -> Self {
        Self::new("cargo", ["run", "--release", "programs/fibonacci.json", "main", "--no-broadcast"])
    }
}

impl CommandTemplate {
    /// A template source running `program` with `args`.
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { program: program.into(), args: args.into_iter().map(Into::into).collect(), current_dir: None }
    }

    /// Runs the command from `dir`.
    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// The command line, for logs and errors.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl TemplateSource for CommandTemplate {
    fn produce(&self) -> Result<Bytes, TemplateError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).stdin(Stdio::null());
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        debug!(command = %self.command_line(), "Generating transaction template");
        let output = cmd
            .output()
            .map_err(|source| TemplateError::Spawn { command: self.command_line(), source })?;
        if !output.status.success() {
            return Err(TemplateError::Failed {
                command: self.command_line(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(Bytes::from(output.stdout))
    }
}

/// A fixed in-process template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticTemplate(pub Bytes);

impl TemplateSource for StaticTemplate {
    fn produce(&self) -> Result<Bytes, TemplateError> {
        Ok(self.0.clone())
    }
}

/// Errors that can occur while producing a template
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// The command could not be started
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The command line.
        command: String,
        /// Underlying IO error.
        source: std::io::Error,
    },
    /// The command exited unsuccessfully
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        /// The command line.
        command: String,
        /// Exit status.
        status: String,
        /// Captured stderr.
        stderr: String,
    },
}
