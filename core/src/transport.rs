//! The remote execution seam.
//!
//! The harness only ever needs three things from a host: put a script
//! somewhere, run it, and optionally delete it. Anything that can do those
//! (ssh today, the local machine for single-box runs and tests) plugs in
//! through [`RemoteExecutor`].

use std::time::Duration;

use async_trait::async_trait;
use sfcheck_common::inventory::Host;
use thiserror::Error;

mod command;
pub mod local;
pub mod ssh;

pub use local::LocalExecutor;
pub use ssh::SshExecutor;

/// What a finished script left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// `None` when the process was killed by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("failed to exec `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` timed out after {after:?}")]
    Timeout { command: String, after: Duration },

    #[error("`{command}` exited with {code:?}: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("failed to write {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Writes `contents` to `path` on `host`, readable and executable only by
    /// the connecting user.
    async fn upload(&self, host: &Host, path: &str, contents: &str) -> Result<(), TransportError>;

    /// Runs the script at `path` with bash, through `sudo -n` when `elevate`
    /// is set. A non-zero exit is a normal [`ExecOutput`], not an error.
    async fn execute(&self, host: &Host, path: &str, elevate: bool)
        -> Result<ExecOutput, TransportError>;

    async fn remove(&self, host: &Host, path: &str) -> Result<(), TransportError>;
}
