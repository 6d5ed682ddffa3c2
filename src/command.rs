//! External command execution.
//!
//! Commands are either captured (stdout returned for assertions) or streamed
//! (inherited stdout/stderr so long-running scripts show progress live).
//! Either way a non-zero exit becomes [`Error::CommandFailed`].

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};

use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// An external program invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    current_dir: Option<PathBuf>,
}

impl CommandSpec {
    /// Create a new invocation of `program`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Run in `dir` instead of the harness's working directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Program name or path.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments, in order.
    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    /// Human-readable command line for logs and errors.
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(OsStr::new(&self.program));
        cmd.args(&self.args).kill_on_drop(true);
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        cmd
    }

    fn spawn_error(&self, source: std::io::Error) -> Error {
        Error::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    fn check(&self, status: ExitStatus, stderr: String) -> Result<()> {
        if status.success() {
            Ok(())
        } else {
            Err(Error::CommandFailed {
                command: self.display(),
                status: status.to_string(),
                stderr,
            })
        }
    }

    /// Run to completion, returning captured stdout.
    pub async fn capture(&self) -> Result<String> {
        debug!(command = %self.display(), "Running command");
        let output = self
            .command()
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        debug!(command = %self.display(), status = %output.status, "Command finished");
        self.check(output.status, stderr)?;
        Ok(stdout)
    }

    /// Run to completion with stdout/stderr streamed to the harness's own.
    pub async fn stream(&self) -> Result<()> {
        info!(command = %self.display(), "Running command");
        let status = self
            .command()
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| self.spawn_error(e))?;
        self.check(status, String::from("see streamed output"))
    }

    /// Blocking variant of [`CommandSpec::stream`] for contexts without an
    /// async runtime (e.g. `Drop`).
    pub fn stream_blocking(&self) -> Result<()> {
        info!(command = %self.display(), "Running command (blocking)");
        let mut cmd = std::process::Command::new(OsStr::new(&self.program));
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }
        let status = cmd.status().map_err(|e| self.spawn_error(e))?;
        self.check(status, String::from("see streamed output"))
    }
}
