//! Runs the real rendered scripts through [`LocalExecutor`] against a
//! throwaway directory standing in for a cluster host.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sfcheck_common::config::{Config, RunPolicy};
use sfcheck_common::inventory::Inventory;
use sfcheck_core::ScenarioId;
use sfcheck_core::runner::{Harness, RunReport, Verdict};
use sfcheck_core::transport::LocalExecutor;
use tempfile::TempDir;

use crate::support::{self, NETWORK_UUID};

const HEALTHY_PING: &str = "PING 10.0.0.6 (10.0.0.6): 56 data bytes\n\
64 bytes from 10.0.0.6: seq=0 ttl=64 time=0.512 ms\n\
\n\
--- 10.0.0.6 ping statistics ---\n\
3 packets transmitted, 3 packets received, 0% packet loss\n";

const DEAD_PING: &str = "--- 10.0.0.6 ping statistics ---\n\
3 packets transmitted, 0 packets received, 100% packet loss\n";

const LOSSY_PING: &str = "--- 10.0.0.6 ping statistics ---\n\
3 packets transmitted, 1 packets received, 66% packet loss\n";

fn bash_available() -> bool {
    ["/bin/bash", "/usr/bin/bash"]
        .iter()
        .any(|p| Path::new(p).exists())
}

/// A fake host: DHCP state, client output, interface addresses and a console
/// stub, all under one temporary directory.
struct FakeHost {
    dir: TempDir,
}

impl FakeHost {
    fn healthy() -> Self {
        let host = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        std::fs::create_dir_all(host.dhcp_dir()).unwrap();
        host.write(
            &host.dhcp_dir().join("hosts"),
            "02:00:00:00:00:05,dhcptest-1,10.0.0.5\n02:00:00:00:00:06,dhcptest-2,10.0.0.6\n",
        );
        host.write(
            &host.path("instances.txt"),
            "uuid  name        state\n1     dhcptest-1  created\n2     dhcptest-2  created\n",
        );
        host.write(
            &host.path("addresses.txt"),
            "2: eth0\n    inet 10.1.0.12/24 brd 10.1.0.255 scope global eth0\n",
        );
        host.console_says(HEALTHY_PING);
        host
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn dhcp_dir(&self) -> PathBuf {
        self.dir.path().join("dhcp").join(NETWORK_UUID)
    }

    fn write(&self, path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
    }

    fn console_says(&self, output: &str) {
        self.write(&self.path("ping.txt"), output);
        // Arguments are `<port> ping <address>`, mirroring the real client.
        self.write(
            &self.path("console.sh"),
            &format!(
                "[ \"$2\" = ping ] || exit 3\ncat {}\n",
                self.path("ping.txt").display()
            ),
        );
    }

    fn inventory(&self) -> Inventory {
        let root = self.dir.path().display();
        let toml = format!(
            r#"{}
[tooling]
dhcp_base_dir = "{root}"
client_command = "cat {root}/instances.txt"
interface_command = "cat {root}/addresses.txt"
console_command = "bash {root}/console.sh"
remote_dir = "{root}"
elevate = false
"#,
            support::INVENTORY
        );
        Inventory::from_toml(&toml).unwrap()
    }

    async fn run(&self, ids: &[ScenarioId], policy: RunPolicy) -> RunReport {
        let inventory = self.inventory();
        let facts = support::facts();
        let cfg = Config {
            policy,
            cleanup: true,
            tooling: inventory.tooling().clone(),
            ..Config::default()
        };
        let executor = LocalExecutor::new(Duration::from_secs(30));

        Harness::new(Box::new(executor), &inventory, &facts, &cfg)
            .run(ids)
            .await
            .unwrap()
    }
}

fn reason_of(report: &RunReport, id: ScenarioId) -> String {
    let result = report.results.iter().find(|r| r.id == id).unwrap();
    result
        .outcomes
        .iter()
        .find_map(|o| match &o.verdict {
            Verdict::Failed { reason } => Some(reason.clone()),
            Verdict::Passed => None,
        })
        .unwrap_or_else(|| panic!("{id} did not fail"))
}

#[tokio::test]
async fn healthy_layout_passes_every_scenario() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();

    let report = host.run(&ScenarioId::ALL, RunPolicy::FailFast).await;

    assert!(report.all_passed(), "{:?}", report.failures());
    let connectivity = report
        .results
        .iter()
        .find(|r| r.id == ScenarioId::Connectivity)
        .unwrap();
    let ping = connectivity.outcomes[0].ping.as_ref().unwrap();
    assert_eq!((ping.transmitted, ping.received), (3, 3));
    assert!(ping.is_lossless());

    // Cleanup left nothing behind in the script directory.
    let leftovers: Vec<_> = std::fs::read_dir(host.dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().starts_with("sfcheck-"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn missing_instance_is_reported() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.write(
        &host.path("instances.txt"),
        "uuid  name        state\n1     dhcptest-1  created\n",
    );

    let report = host
        .run(&[ScenarioId::InstancesVisible], RunPolicy::FailFast)
        .await;

    assert!(!report.all_passed());
    assert_eq!(
        reason_of(&report, ScenarioId::InstancesVisible),
        "check instance:dhcptest-2: observed 0, expected 1"
    );
}

#[tokio::test]
async fn duplicated_dhcp_entry_fails() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.write(
        &host.dhcp_dir().join("hosts"),
        "02:00:00:00:00:05,dhcptest-1,10.0.0.5\n02:00:00:00:00:07,stale,10.0.0.5\n02:00:00:00:00:06,dhcptest-2,10.0.0.6\n",
    );

    let report = host
        .run(&[ScenarioId::DhcpHostsPresent], RunPolicy::FailFast)
        .await;

    assert_eq!(
        reason_of(&report, ScenarioId::DhcpHostsPresent),
        "check dhcp-host:10.0.0.5: observed 2, expected 1"
    );
}

#[tokio::test]
async fn missing_hosts_file_fails() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    std::fs::remove_file(host.dhcp_dir().join("hosts")).unwrap();

    let report = host
        .run(&[ScenarioId::DhcpHostsPresent], RunPolicy::FailFast)
        .await;

    assert_eq!(
        reason_of(&report, ScenarioId::DhcpHostsPresent),
        "check dhcp-hosts-file: observed 0, expected 1"
    );
}

#[tokio::test]
async fn dhcp_config_off_the_network_node_fails_and_aborts() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.write(&host.dhcp_dir().join("config"), "interface=br-vxlan\n");

    let report = host.run(&ScenarioId::ALL, RunPolicy::FailFast).await;

    assert_eq!(
        reason_of(&report, ScenarioId::DhcpAbsent),
        "check dhcp-config-absent: observed 1, expected 0"
    );
    assert_eq!(report.skipped, vec![ScenarioId::Connectivity]);
}

#[tokio::test]
async fn gateway_address_off_the_network_node_fails() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.write(
        &host.path("addresses.txt"),
        "2: eth0\n    inet 10.1.0.12/24 scope global eth0\n7: br-vxlan\n    inet 10.0.0.1/24 scope global br-vxlan\n",
    );

    let report = host.run(&[ScenarioId::DhcpAbsent], RunPolicy::FailFast).await;

    assert_eq!(
        reason_of(&report, ScenarioId::DhcpAbsent),
        "check gateway:10.0.0.1: observed 1, expected 0"
    );
}

#[tokio::test]
async fn similar_addresses_do_not_count_as_the_gateway() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.write(
        &host.path("addresses.txt"),
        "    inet 10.0.0.12/24 scope global eth0\n    inet 110.0.0.1/8 scope global eth1\n",
    );

    let report = host.run(&[ScenarioId::DhcpAbsent], RunPolicy::FailFast).await;

    assert!(report.all_passed(), "{:?}", report.failures());
}

#[tokio::test]
async fn packet_loss_fails_connectivity() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.console_says(LOSSY_PING);

    let report = host
        .run(&[ScenarioId::Connectivity], RunPolicy::KeepGoing)
        .await;

    assert_eq!(
        reason_of(&report, ScenarioId::Connectivity),
        "check ping:dhcptest-1:10.0.0.6: observed 0, expected 1"
    );
    let outcome = &report.results[0].outcomes[0];
    assert!(!outcome.ping.as_ref().unwrap().is_lossless());
}

#[tokio::test]
async fn only_the_last_ping_summary_counts() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.console_says(&format!("{HEALTHY_PING}{DEAD_PING}"));

    let report = host
        .run(&[ScenarioId::Connectivity], RunPolicy::FailFast)
        .await;

    assert_eq!(
        reason_of(&report, ScenarioId::Connectivity),
        "check ping:dhcptest-1:10.0.0.6: observed 0, expected 1"
    );
    let ping = report.results[0].outcomes[0].ping.unwrap();
    assert_eq!(ping.loss_percent, 100.0);
}

#[tokio::test]
async fn clean_ping_relayed_twice_passes() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.console_says(&format!("{HEALTHY_PING}{HEALTHY_PING}"));

    let report = host
        .run(&[ScenarioId::Connectivity], RunPolicy::FailFast)
        .await;

    assert!(report.all_passed(), "{:?}", report.failures());
    assert!(report.results[0].outcomes[0].ping.unwrap().is_lossless());
}

#[tokio::test]
async fn instance_listed_twice_fails() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.write(
        &host.path("instances.txt"),
        "uuid  name        state\n1     dhcptest-1  created\n2     dhcptest-2  created\n3     dhcptest-1  deleted\n",
    );

    let report = host
        .run(&[ScenarioId::InstancesVisible], RunPolicy::FailFast)
        .await;

    assert_eq!(
        reason_of(&report, ScenarioId::InstancesVisible),
        "check instance:dhcptest-1: observed 2, expected 1"
    );
}

#[tokio::test]
async fn longer_names_and_addresses_are_not_matches() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.write(
        &host.path("instances.txt"),
        "1     dhcptest-1  created\n2     dhcptest-2  created\n3     dhcptest-10 created\n",
    );
    host.write(
        &host.dhcp_dir().join("hosts"),
        "02:00:00:00:00:05,dhcptest-1,10.0.0.5\n02:00:00:00:00:32,other,10.0.0.50\n02:00:00:00:00:06,dhcptest-2,10.0.0.6\n",
    );

    let report = host
        .run(
            &[ScenarioId::InstancesVisible, ScenarioId::DhcpHostsPresent],
            RunPolicy::FailFast,
        )
        .await;

    assert!(report.all_passed(), "{:?}", report.failures());
}

#[tokio::test]
async fn address_suffix_does_not_stand_in_for_the_address() {
    if !bash_available() {
        return;
    }
    let host = FakeHost::healthy();
    host.write(
        &host.dhcp_dir().join("hosts"),
        "02:00:00:00:00:32,other,10.0.0.50\n02:00:00:00:00:06,dhcptest-2,10.0.0.6\n",
    );

    let report = host
        .run(&[ScenarioId::DhcpHostsPresent], RunPolicy::FailFast)
        .await;

    assert_eq!(
        reason_of(&report, ScenarioId::DhcpHostsPresent),
        "check dhcp-host:10.0.0.5: observed 0, expected 1"
    );
}
