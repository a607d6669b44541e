use colored::*;

use crate::commands::{Sources, load_sources};
use crate::mprint;
use crate::terminal::colors;
use crate::terminal::print::{self, Row};
use sfcheck_common::inventory::{Host, Role};

/// Prints the resolved inventory and facts, mostly to check what `run` would
/// use before pointing it at a cluster.
pub fn show(sources: &Sources, quiet: u8) -> anyhow::Result<()> {
    let (inventory, facts) = load_sources(sources)?;

    print::header("Roles", quiet);
    let roles: Vec<Row> = [Role::Hypervisors, Role::NetworkNode, Role::NonNetworkNode]
        .into_iter()
        .map(|role| {
            let names: Vec<&str> = inventory
                .hosts_for(role)
                .iter()
                .map(|h| h.name.as_str())
                .collect();
            (role.to_string(), names.join(", ").normal())
        })
        .collect();
    print::aligned(&roles);

    mprint!();
    print::header("Hosts", quiet);
    let hosts: Vec<Row> = inventory
        .hosts()
        .map(|h| (h.name.clone(), login(h).color(colors::ADDRESS)))
        .collect();
    print::aligned(&hosts);

    let tooling = inventory.tooling();
    let network = facts.network();
    mprint!();
    print::header("Network", quiet);
    print::aligned(&[
        ("uuid".to_string(), network.uuid.to_string().normal()),
        ("netblock".to_string(), network.netblock.to_string().color(colors::ADDRESS)),
        ("gateway".to_string(), network.gateway().to_string().color(colors::ADDRESS)),
        ("hosts file".to_string(), tooling.dhcp_hosts_path(&network.uuid).normal()),
        ("elevate".to_string(), tooling.elevate.to_string().normal()),
    ]);

    mprint!();
    print::header("Instances", quiet);
    for instance in facts.instances() {
        print::tree(
            &instance.name,
            &[
                ("Address".to_string(), instance.address.to_string().color(colors::ADDRESS)),
                ("Node".to_string(), instance.node.as_str().normal()),
                ("Console".to_string(), instance.console_port.to_string().normal()),
            ],
        );
    }

    Ok(())
}

/// `user@address:port` the way ssh will be pointed at it.
fn login(host: &Host) -> String {
    let mut login = match &host.user {
        Some(user) => format!("{user}@{}", host.address),
        None => host.address.clone(),
    };
    if let Some(port) = host.port {
        login.push_str(&format!(":{port}"));
    }
    login
}
