use std::time::Duration;

use serde::Deserialize;

pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// What to do once a scenario fails on some host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunPolicy {
    /// Abort the whole run at the first failure.
    #[default]
    FailFast,
    /// Run everything and report every failure at the end.
    KeepGoing,
}

pub struct Config {
    /// Reduces terminal output. `1` drops headers, `2` drops per-host lines.
    pub quiet: u8,
    pub policy: RunPolicy,
    /// Removes the uploaded scripts after running them.
    ///
    /// Removal failures are logged and never fail a scenario.
    pub cleanup: bool,
    /// Upper bound for each remote command, including uploads.
    pub command_timeout: Duration,
    pub tooling: Tooling,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            quiet: 0,
            policy: RunPolicy::default(),
            cleanup: false,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            tooling: Tooling::default(),
        }
    }
}

/// Paths and commands on the cluster hosts that the rendered scripts rely on.
///
/// Read from the optional `[tooling]` table of the inventory file.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Tooling {
    /// Directory holding `dhcp/<network-id>/{hosts,config}` on the network node.
    pub dhcp_base_dir: String,
    /// Prints one line per instance known to the platform.
    pub client_command: String,
    /// Prints the addresses configured on local interfaces.
    pub interface_command: String,
    /// Invoked as `<console_command> <port> ping <address>`.
    pub console_command: String,
    /// Where scripts are written on the remote host.
    pub remote_dir: String,
    /// Runs scripts through `sudo -n`.
    pub elevate: bool,
}

impl Default for Tooling {
    fn default() -> Self {
        Self {
            dhcp_base_dir: "/srv/shakenfist".to_string(),
            client_command: "sf-client instance list".to_string(),
            interface_command: "ip addr".to_string(),
            console_command: "/opt/telnet_client.py".to_string(),
            remote_dir: "/tmp".to_string(),
            elevate: true,
        }
    }
}

impl Tooling {
    pub fn dhcp_dir(&self, network: &uuid::Uuid) -> String {
        format!("{}/dhcp/{}", self.dhcp_base_dir.trim_end_matches('/'), network)
    }

    pub fn dhcp_hosts_path(&self, network: &uuid::Uuid) -> String {
        format!("{}/hosts", self.dhcp_dir(network))
    }

    pub fn dhcp_config_path(&self, network: &uuid::Uuid) -> String {
        format!("{}/config", self.dhcp_dir(network))
    }
}
