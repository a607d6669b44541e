//! Wrapper for `tokio::process::Command` where the builder methods take and
//! return `self`, plus a bounded run that captures output.

use std::ffi::OsStr;
use std::fmt;
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::{ExecOutput, TransportError};

pub(crate) struct Command {
    inner: tokio::process::Command,
}

impl Command {
    pub(crate) fn new(program: impl AsRef<OsStr>) -> Command {
        Command {
            inner: tokio::process::Command::new(program),
        }
    }

    pub(crate) fn arg(mut self, arg: impl AsRef<OsStr>) -> Command {
        self.inner.arg(arg);
        self
    }

    pub(crate) fn args(mut self, args: impl IntoIterator<Item = impl AsRef<OsStr>>) -> Command {
        self.inner.args(args);
        self
    }

    /// Spawns the command, feeds it `stdin` if given, and waits at most
    /// `timeout` for it to exit. The child is killed if the deadline passes.
    pub(crate) async fn run(
        mut self,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError> {
        let description = self.to_string();
        let stdin_cfg = if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        };
        self.inner
            .stdin(stdin_cfg)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!("running: {description}");
        let start = Instant::now();

        let mut child = self.inner.spawn().map_err(|source| TransportError::Spawn {
            command: description.clone(),
            source,
        })?;

        let io = async move {
            if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
                pipe.write_all(input).await?;
                pipe.shutdown().await?;
            }
            child.wait_with_output().await
        };

        let output = match tokio::time::timeout(timeout, io).await {
            Ok(result) => result.map_err(|source| TransportError::Spawn {
                command: description.clone(),
                source,
            })?,
            Err(_) => {
                return Err(TransportError::Timeout {
                    command: description,
                    after: timeout,
                });
            }
        };

        debug!(
            "process exited with {} ({:?})",
            output.status,
            start.elapsed()
        );

        Ok(ExecOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Like [`Command::run`], but a non-zero exit becomes an error.
    pub(crate) async fn ensure_success(
        self,
        stdin: Option<&[u8]>,
        timeout: Duration,
    ) -> Result<ExecOutput, TransportError> {
        let description = self.to_string();
        let output = self.run(stdin, timeout).await?;
        if output.success() {
            Ok(output)
        } else {
            Err(TransportError::Failed {
                command: description,
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let command = self.inner.as_std();
        write!(f, "{}", shell_escape::unix::escape(command.get_program().to_string_lossy()))?;
        for arg in command.get_args() {
            write!(f, " {}", shell_escape::unix::escape(arg.to_string_lossy()))?;
        }
        Ok(())
    }
}
