//! Runs scripts on cluster hosts through the system `ssh` client.
//!
//! Keys, agents and jump hosts are whatever the operator's ssh config says.
//! The harness never prompts: `BatchMode=yes` turns a missing key into a
//! transport error instead of a hung run.

use std::time::Duration;

use async_trait::async_trait;
use shell_escape::unix::escape;
use sfcheck_common::inventory::Host;

use super::command::Command;
use super::{ExecOutput, RemoteExecutor, TransportError};

pub struct SshExecutor {
    timeout: Duration,
    program: String,
}

impl SshExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            program: "ssh".to_string(),
        }
    }

    /// Uses another ssh-compatible client binary.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    fn command(&self, host: &Host, remote_cmd: &str) -> Command {
        Command::new(&self.program).args(ssh_args(host, remote_cmd))
    }
}

/// Arguments for `ssh` running `remote_cmd` on `host`.
fn ssh_args(host: &Host, remote_cmd: &str) -> Vec<String> {
    let mut args = vec![
        "-o".to_string(),
        "BatchMode=yes".to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking=no".to_string(),
    ];
    if let Some(port) = host.port {
        args.push("-p".to_string());
        args.push(port.to_string());
    }
    if let Some(user) = &host.user {
        args.push("-l".to_string());
        args.push(user.clone());
    }
    args.push(host.address.clone());
    args.push("--".to_string());
    args.push(remote_cmd.to_string());
    args
}

fn upload_cmd(path: &str) -> String {
    let path = escape(path.into());
    format!("umask 077 && cat > {path} && chmod 0700 {path}")
}

fn execute_cmd(path: &str, elevate: bool) -> String {
    let path = escape(path.into());
    if elevate {
        format!("sudo -n /bin/bash {path}")
    } else {
        format!("/bin/bash {path}")
    }
}

fn remove_cmd(path: &str) -> String {
    format!("rm -f {}", escape(path.into()))
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn upload(&self, host: &Host, path: &str, contents: &str) -> Result<(), TransportError> {
        self.command(host, &upload_cmd(path))
            .ensure_success(Some(contents.as_bytes()), self.timeout)
            .await
            .map(|_| ())
    }

    async fn execute(
        &self,
        host: &Host,
        path: &str,
        elevate: bool,
    ) -> Result<ExecOutput, TransportError> {
        let output = self
            .command(host, &execute_cmd(path, elevate))
            .run(None, self.timeout)
            .await?;

        // ssh reserves 255 for its own failures; the script never gets to run.
        if output.code == Some(255) {
            return Err(TransportError::Failed {
                command: format!("ssh {}", host.address),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }
        Ok(output)
    }

    async fn remove(&self, host: &Host, path: &str) -> Result<(), TransportError> {
        self.command(host, &remove_cmd(path))
            .ensure_success(None, self.timeout)
            .await
            .map(|_| ())
    }
}
