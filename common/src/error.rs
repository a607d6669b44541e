use std::net::Ipv4Addr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating the host inventory.
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("failed to read inventory {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse inventory {origin}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("hosts not listed in inventory: {0:?}")]
    UnknownHosts(Vec<String>),

    #[error("group `{0}` has no hosts")]
    EmptyGroup(&'static str),

    #[error("`{0}` cannot be both the network node and the non-network node")]
    RoleConflict(String),

    #[error("host `{0}` has an empty address")]
    EmptyAddress(String),
}

/// Errors raised while loading or validating provisioning facts.
#[derive(Error, Debug)]
pub enum FactsError {
    #[error("failed to read facts {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse facts {origin}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid netblock `{netblock}`: {reason}")]
    InvalidNetblock { netblock: String, reason: String },

    #[error("netblock {0} has no usable gateway address")]
    NoGateway(String),

    #[error("gateway {gateway} is not a host address of {netblock}")]
    GatewayOutsideNetblock { gateway: Ipv4Addr, netblock: String },

    #[error("instance name `{0}` must be non-empty and free of whitespace")]
    InvalidInstanceName(String),

    #[error("expected exactly two instances, found {0}")]
    InstanceCount(usize),

    #[error("expected one instance named `*-1` and one named `*-2`, found {0:?}")]
    InstanceSuffixes(Vec<String>),

    #[error("instance `{name}` has address {address} outside netblock {netblock}")]
    AddressOutsideNetblock {
        name: String,
        address: Ipv4Addr,
        netblock: String,
    },

    #[error("instances `{0}` and `{1}` share address {2}")]
    DuplicateAddress(String, String, Ipv4Addr),

    #[error("instance `{name}` address {address} collides with the gateway")]
    AddressIsGateway { name: String, address: Ipv4Addr },

    #[error("instance `{name}` runs on `{node}`, which is not in the inventory")]
    UnknownNode { name: String, node: String },
}
