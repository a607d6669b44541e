//! # Provisioning Facts
//!
//! The provisioning step creates one virtual network and two cirros
//! instances on it, then writes what it created to a JSON document. The
//! harness never talks to the platform API itself; everything it knows about
//! the network comes from here.

use std::net::Ipv4Addr;
use std::path::Path;

use pnet::ipnetwork::Ipv4Network;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::FactsError;
use crate::inventory::Inventory;
use crate::network::netblock;

/// The virtual network under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    pub uuid: Uuid,
    pub netblock: Ipv4Network,
    gateway: Ipv4Addr,
}

impl Network {
    /// Builds a network, placing the gateway on the first usable address
    /// unless one is given.
    pub fn new(
        uuid: Uuid,
        netblock: Ipv4Network,
        gateway: Option<Ipv4Addr>,
    ) -> Result<Self, FactsError> {
        let gateway = match gateway {
            Some(gw) => {
                if !netblock::is_host_address(&netblock, gw) {
                    return Err(FactsError::GatewayOutsideNetblock {
                        gateway: gw,
                        netblock: netblock.to_string(),
                    });
                }
                gw
            }
            None => netblock::first_usable(&netblock)
                .ok_or_else(|| FactsError::NoGateway(netblock.to_string()))?,
        };

        Ok(Self {
            uuid,
            netblock,
            gateway,
        })
    }

    pub fn gateway(&self) -> Ipv4Addr {
        self.gateway
    }
}

/// One provisioned instance.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InstanceRecord {
    pub name: String,
    pub address: Ipv4Addr,
    /// Inventory name of the hypervisor running the instance.
    pub node: String,
    pub console_port: u16,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawNetwork {
    uuid: Uuid,
    netblock: String,
    #[serde(default)]
    gateway: Option<Ipv4Addr>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFacts {
    network: RawNetwork,
    instances: Vec<InstanceRecord>,
}

/// Everything provisioning handed over. Read-only for the whole run.
#[derive(Debug, Clone)]
pub struct Facts {
    network: Network,
    /// Always `[*-1, *-2]`.
    instances: [InstanceRecord; 2],
}

impl Facts {
    pub fn load(path: &Path) -> Result<Self, FactsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| FactsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    pub fn from_json(contents: &str) -> Result<Self, FactsError> {
        Self::parse(contents, "<inline>")
    }

    fn parse(contents: &str, origin: &str) -> Result<Self, FactsError> {
        let raw: RawFacts = serde_json::from_str(contents).map_err(|source| FactsError::Parse {
            origin: origin.to_string(),
            source,
        })?;

        let netblock = netblock::parse_netblock(&raw.network.netblock)?;
        let network = Network::new(raw.network.uuid, netblock, raw.network.gateway)?;

        Self::new(network, raw.instances)
    }

    /// Validates the instance pair against the network and orders it by suffix.
    pub fn new(network: Network, instances: Vec<InstanceRecord>) -> Result<Self, FactsError> {
        if instances.len() != 2 {
            return Err(FactsError::InstanceCount(instances.len()));
        }

        let names: Vec<String> = instances.iter().map(|i| i.name.clone()).collect();
        let first = instances.iter().position(|i| i.name.ends_with("-1"));
        let second = instances.iter().position(|i| i.name.ends_with("-2"));
        let (Some(first), Some(second)) = (first, second) else {
            return Err(FactsError::InstanceSuffixes(names));
        };

        for instance in &instances {
            if instance.name.is_empty() || instance.name.contains(char::is_whitespace) {
                return Err(FactsError::InvalidInstanceName(instance.name.clone()));
            }
            if !netblock::is_host_address(&network.netblock, instance.address) {
                return Err(FactsError::AddressOutsideNetblock {
                    name: instance.name.clone(),
                    address: instance.address,
                    netblock: network.netblock.to_string(),
                });
            }
            if instance.address == network.gateway() {
                return Err(FactsError::AddressIsGateway {
                    name: instance.name.clone(),
                    address: instance.address,
                });
            }
        }

        if instances[0].address == instances[1].address {
            return Err(FactsError::DuplicateAddress(
                instances[0].name.clone(),
                instances[1].name.clone(),
                instances[0].address,
            ));
        }

        let instances = [instances[first].clone(), instances[second].clone()];
        Ok(Self { network, instances })
    }

    /// Fails when an instance claims to run on a host the inventory doesn't know.
    pub fn check_nodes(&self, inventory: &Inventory) -> Result<(), FactsError> {
        for instance in &self.instances {
            if inventory.host(&instance.node).is_none() {
                return Err(FactsError::UnknownNode {
                    name: instance.name.clone(),
                    node: instance.node.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn instances(&self) -> &[InstanceRecord; 2] {
        &self.instances
    }

    /// The instance named `*-1`; the connectivity check pings from here.
    pub fn first(&self) -> &InstanceRecord {
        &self.instances[0]
    }

    pub fn second(&self) -> &InstanceRecord {
        &self.instances[1]
    }
}
