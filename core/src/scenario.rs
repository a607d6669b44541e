//! The fixed catalogue of DHCP correctness scenarios.
//!
//! Each scenario is a shell template plus the hosts it must run on. The
//! harness runs them in catalogue order.

use std::fmt;
use std::str::FromStr;

use sfcheck_common::config::Tooling;
use sfcheck_common::facts::Facts;
use sfcheck_common::inventory::{Host, Inventory, Role};

use crate::template::{self, Params, RenderError};

const PRELUDE: &str = include_str!("scenario/prelude.sh");
const INSTANCES_VISIBLE: &str = include_str!("scenario/instances_visible.sh");
const DHCP_HOSTS_PRESENT: &str = include_str!("scenario/dhcp_hosts_present.sh");
const DHCP_ABSENT: &str = include_str!("scenario/dhcp_absent.sh");
const CONNECTIVITY: &str = include_str!("scenario/connectivity.sh");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScenarioId {
    InstancesVisible,
    DhcpHostsPresent,
    DhcpAbsent,
    Connectivity,
}

impl ScenarioId {
    /// Catalogue order.
    pub const ALL: [ScenarioId; 4] = [
        ScenarioId::InstancesVisible,
        ScenarioId::DhcpHostsPresent,
        ScenarioId::DhcpAbsent,
        ScenarioId::Connectivity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioId::InstancesVisible => "instances-visible",
            ScenarioId::DhcpHostsPresent => "dhcp-hosts-present",
            ScenarioId::DhcpAbsent => "dhcp-absent",
            ScenarioId::Connectivity => "connectivity",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::InstancesVisible => "both instances are listed exactly once by the client",
            ScenarioId::DhcpHostsPresent => "the DHCP hosts file holds exactly one entry per instance",
            ScenarioId::DhcpAbsent => "no DHCP config and no gateway address off the network node",
            ScenarioId::Connectivity => "instance -1 pings instance -2 with 0% packet loss",
        }
    }

    fn template(&self) -> &'static str {
        match self {
            ScenarioId::InstancesVisible => INSTANCES_VISIBLE,
            ScenarioId::DhcpHostsPresent => DHCP_HOSTS_PRESENT,
            ScenarioId::DhcpAbsent => DHCP_ABSENT,
            ScenarioId::Connectivity => CONNECTIVITY,
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        ScenarioId::ALL
            .into_iter()
            .find(|id| id.as_str() == lower)
            .ok_or_else(|| {
                let known: Vec<&str> = ScenarioId::ALL.iter().map(|id| id.as_str()).collect();
                format!("unknown scenario `{s}` (expected one of: {})", known.join(", "))
            })
    }
}

/// Where a scenario runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    Role(Role),
    /// The hypervisor running instance `-1`, which owns its console port.
    FirstInstanceNode,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Role(role) => write!(f, "{role}"),
            Target::FirstInstanceNode => f.write_str("node of instance -1"),
        }
    }
}

/// A scenario rendered and bound to its hosts, ready to run.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: ScenarioId,
    pub target: Target,
    pub script: String,
}

impl Scenario {
    pub fn target_of(id: ScenarioId) -> Target {
        match id {
            ScenarioId::InstancesVisible => Target::Role(Role::Hypervisors),
            ScenarioId::DhcpHostsPresent => Target::Role(Role::NetworkNode),
            ScenarioId::DhcpAbsent => Target::Role(Role::NonNetworkNode),
            ScenarioId::Connectivity => Target::FirstInstanceNode,
        }
    }

    /// Renders the script for `id` from the facts and tooling.
    pub fn prepare(id: ScenarioId, facts: &Facts, tooling: &Tooling) -> Result<Self, RenderError> {
        let params = params_for(id, facts, tooling);
        let template = format!("{PRELUDE}{}", id.template());
        let script = template::render(id.as_str(), &template, &params)?;

        Ok(Self {
            id,
            target: Self::target_of(id),
            script,
        })
    }

    /// Hosts this scenario runs on, in inventory order.
    pub fn hosts<'a>(&self, inventory: &'a Inventory, facts: &Facts) -> Vec<&'a Host> {
        match &self.target {
            Target::Role(role) => inventory.hosts_for(*role),
            Target::FirstInstanceNode => inventory.host(&facts.first().node).into_iter().collect(),
        }
    }
}

/// Renders every scenario in `ids`, keeping catalogue order and dropping
/// duplicates. Fails before anything runs if any template is broken.
pub fn prepare_all(
    ids: &[ScenarioId],
    facts: &Facts,
    tooling: &Tooling,
) -> Result<Vec<Scenario>, RenderError> {
    ScenarioId::ALL
        .into_iter()
        .filter(|id| ids.contains(id))
        .map(|id| Scenario::prepare(id, facts, tooling))
        .collect()
}

fn params_for(id: ScenarioId, facts: &Facts, tooling: &Tooling) -> Params {
    let network = facts.network();
    let first = facts.first();
    let second = facts.second();
    let params = Params::new().quoted("scenario", id.as_str());

    match id {
        ScenarioId::InstancesVisible => params
            .raw("client_command", &tooling.client_command)
            .quoted("first_name", &first.name)
            .quoted("second_name", &second.name),
        ScenarioId::DhcpHostsPresent => params
            .quoted("hosts_path", tooling.dhcp_hosts_path(&network.uuid))
            .quoted("first_address", first.address)
            .quoted("second_address", second.address),
        ScenarioId::DhcpAbsent => params
            .quoted("config_path", tooling.dhcp_config_path(&network.uuid))
            .raw("interface_command", &tooling.interface_command)
            .quoted("gateway", network.gateway()),
        ScenarioId::Connectivity => params
            .raw("console_command", &tooling.console_command)
            .quoted("console_port", first.console_port)
            .quoted("source_name", &first.name)
            .quoted("target_address", second.address),
    }
}
