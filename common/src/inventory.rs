//! # Host Inventory
//!
//! Maps the roles a check can target onto concrete machines.
//!
//! ```toml
//! [groups]
//! hypervisors = ["sf-1", "sf-2", "sf-3"]
//! network_node = "sf-1"
//! non_network_node = "sf-2"
//!
//! [hosts.sf-1]
//! address = "10.1.0.11"
//! user = "ubuntu"
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::config::Tooling;
use crate::error::InventoryError;

/// The part a host plays in the cluster under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// Every machine able to run instances.
    Hypervisors,
    /// The single host serving DHCP for the network.
    NetworkNode,
    /// A host that must not serve DHCP for the network.
    NonNetworkNode,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Hypervisors => "hypervisors",
            Role::NetworkNode => "network node",
            Role::NonNetworkNode => "non-network node",
        };
        f.write_str(name)
    }
}

/// A machine reachable over ssh.
#[derive(Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Host {
    /// Filled from the inventory table key.
    #[serde(skip)]
    pub name: String,
    pub address: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
}

impl Host {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            user: None,
            port: None,
        }
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.address)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
struct Groups {
    hypervisors: Vec<String>,
    network_node: String,
    non_network_node: String,
}

#[derive(Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct RawInventory {
    groups: Groups,
    hosts: BTreeMap<String, Host>,
    #[serde(default)]
    tooling: Tooling,
}

#[derive(Debug, Clone)]
pub struct Inventory {
    groups: Groups,
    hosts: BTreeMap<String, Host>,
    tooling: Tooling,
}

impl Inventory {
    pub fn load(path: &Path) -> Result<Self, InventoryError> {
        let contents = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    pub fn from_toml(contents: &str) -> Result<Self, InventoryError> {
        Self::parse(contents, "<inline>")
    }

    /// Builds an inventory directly, mostly for tests and single-box runs.
    pub fn new(
        hosts: Vec<Host>,
        hypervisors: Vec<String>,
        network_node: impl Into<String>,
        non_network_node: impl Into<String>,
    ) -> Result<Self, InventoryError> {
        let inventory = Self {
            groups: Groups {
                hypervisors,
                network_node: network_node.into(),
                non_network_node: non_network_node.into(),
            },
            hosts: hosts.into_iter().map(|h| (h.name.clone(), h)).collect(),
            tooling: Tooling::default(),
        };
        inventory.validate()?;
        Ok(inventory)
    }

    fn parse(contents: &str, origin: &str) -> Result<Self, InventoryError> {
        let raw: RawInventory = toml::from_str(contents).map_err(|source| InventoryError::Parse {
            origin: origin.to_string(),
            source,
        })?;

        let hosts = raw
            .hosts
            .into_iter()
            .map(|(name, mut host)| {
                host.name = name.clone();
                (name, host)
            })
            .collect();

        let inventory = Self {
            groups: raw.groups,
            hosts,
            tooling: raw.tooling,
        };
        inventory.validate()?;
        Ok(inventory)
    }

    fn validate(&self) -> Result<(), InventoryError> {
        if self.groups.hypervisors.is_empty() {
            return Err(InventoryError::EmptyGroup("hypervisors"));
        }

        if self.groups.network_node == self.groups.non_network_node {
            return Err(InventoryError::RoleConflict(self.groups.network_node.clone()));
        }

        let referenced: BTreeSet<&String> = self
            .groups
            .hypervisors
            .iter()
            .chain([&self.groups.network_node, &self.groups.non_network_node])
            .collect();
        let unknown: Vec<String> = referenced
            .into_iter()
            .filter(|name| !self.hosts.contains_key(*name))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(InventoryError::UnknownHosts(unknown));
        }

        if let Some(host) = self.hosts.values().find(|h| h.address.trim().is_empty()) {
            return Err(InventoryError::EmptyAddress(host.name.clone()));
        }

        Ok(())
    }

    /// Hosts playing `role`, in inventory order.
    pub fn hosts_for(&self, role: Role) -> Vec<&Host> {
        match role {
            Role::Hypervisors => {
                let mut seen = BTreeSet::new();
                self.groups
                    .hypervisors
                    .iter()
                    .filter(|name| seen.insert(name.as_str()))
                    .filter_map(|name| self.hosts.get(name))
                    .collect()
            }
            Role::NetworkNode => self.hosts.get(&self.groups.network_node).into_iter().collect(),
            Role::NonNetworkNode => self
                .hosts
                .get(&self.groups.non_network_node)
                .into_iter()
                .collect(),
        }
    }

    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.get(name)
    }

    /// Every host in the file, sorted by name, whether or not a group uses it.
    pub fn hosts(&self) -> impl Iterator<Item = &Host> {
        self.hosts.values()
    }

    pub fn tooling(&self) -> &Tooling {
        &self.tooling
    }
}
