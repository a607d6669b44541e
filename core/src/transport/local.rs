//! Runs scripts on this machine, ignoring the host's address.
//!
//! Useful on single-box deployments where every role is the local host, and
//! for exercising rendered scripts against a fake filesystem layout.

use std::time::Duration;

use async_trait::async_trait;
use sfcheck_common::inventory::Host;
use tracing::debug;

use super::command::Command;
use super::{ExecOutput, RemoteExecutor, TransportError};

pub struct LocalExecutor {
    timeout: Duration,
}

impl LocalExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl RemoteExecutor for LocalExecutor {
    async fn upload(&self, host: &Host, path: &str, contents: &str) -> Result<(), TransportError> {
        debug!("writing {path} for {}", host.name);
        let io_err = |source| TransportError::Io {
            path: path.to_string(),
            source,
        };

        tokio::fs::write(path, contents).await.map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
                .await
                .map_err(io_err)?;
        }

        Ok(())
    }

    async fn execute(
        &self,
        _host: &Host,
        path: &str,
        elevate: bool,
    ) -> Result<ExecOutput, TransportError> {
        let cmd = if elevate {
            Command::new("sudo").args(["-n", "bash", path])
        } else {
            Command::new("bash").arg(path)
        };
        cmd.run(None, self.timeout).await
    }

    async fn remove(&self, _host: &Host, path: &str) -> Result<(), TransportError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TransportError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}
