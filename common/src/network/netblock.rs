//! # Virtual Network Addressing
//!
//! Helpers around the IPv4 netblock a virtual network is carved from.
//! The platform places the network's router on the first usable address,
//! which is what the DHCP-absence check looks for on other hosts.

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;

use crate::error::FactsError;

/// Parses CIDR notation like "10.0.0.0/24".
pub fn parse_netblock(s: &str) -> Result<Ipv4Network, FactsError> {
    let Some((ip_str, prefix_str)) = s.trim().split_once('/') else {
        return Err(FactsError::InvalidNetblock {
            netblock: s.to_string(),
            reason: "missing prefix length".to_string(),
        });
    };

    let ip = ip_str
        .parse::<Ipv4Addr>()
        .map_err(|e| FactsError::InvalidNetblock {
            netblock: s.to_string(),
            reason: format!("invalid address '{ip_str}': {e}"),
        })?;

    let prefix = prefix_str
        .parse::<u8>()
        .map_err(|e| FactsError::InvalidNetblock {
            netblock: s.to_string(),
            reason: format!("invalid prefix '{prefix_str}': {e}"),
        })?;

    let net = Ipv4Network::new(ip, prefix).map_err(|e| FactsError::InvalidNetblock {
        netblock: s.to_string(),
        reason: e.to_string(),
    })?;

    // Normalize "10.0.0.7/24" to "10.0.0.0/24".
    Ipv4Network::new(net.network(), prefix).map_err(|e| FactsError::InvalidNetblock {
        netblock: s.to_string(),
        reason: e.to_string(),
    })
}

/// Returns the first address after the network address.
///
/// `/31` and `/32` blocks have no room for a router next to the network
/// address and yield `None`.
pub fn first_usable(net: &Ipv4Network) -> Option<Ipv4Addr> {
    if net.prefix() >= 31 {
        return None;
    }

    let net_u32: u32 = u32::from(net.network());
    let broadcast_u32: u32 = u32::from(net.broadcast());
    let start_u32 = net_u32.saturating_add(1);

    if start_u32 < broadcast_u32 {
        Some(Ipv4Addr::from(start_u32))
    } else {
        None
    }
}

/// True when `addr` is a host address of `net` (neither network nor broadcast).
pub fn is_host_address(net: &Ipv4Network, addr: Ipv4Addr) -> bool {
    net.contains(addr) && addr != net.network() && addr != net.broadcast()
}
