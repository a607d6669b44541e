use std::sync::{Arc, Mutex};

use sfcheck_common::config::{Config, RunPolicy};
use sfcheck_common::facts::Facts;
use sfcheck_common::inventory::Host;
use sfcheck_core::runner::{Harness, HarnessError, Verdict};
use sfcheck_core::ScenarioId;

use crate::support::{self, Call, NETWORK_UUID, RecordingExecutor};

fn keep_going() -> Config {
    Config {
        policy: RunPolicy::KeepGoing,
        ..Config::default()
    }
}

fn pairs(expected: &[(ScenarioId, &str)]) -> Vec<(ScenarioId, String)> {
    expected
        .iter()
        .map(|(id, host)| (*id, host.to_string()))
        .collect()
}

#[tokio::test]
async fn every_scenario_runs_on_its_hosts_in_order() {
    let inventory = support::inventory();
    let facts = support::facts();
    let cfg = Config::default();
    let executor = RecordingExecutor::new();

    let report = Harness::new(Box::new(executor.clone()), &inventory, &facts, &cfg)
        .run(&ScenarioId::ALL)
        .await
        .unwrap();

    assert!(report.all_passed());
    assert!(!report.aborted());
    assert_eq!(report.results.len(), 4);
    assert_eq!(
        executor.executed(),
        pairs(&[
            (ScenarioId::InstancesVisible, "sf-1"),
            (ScenarioId::InstancesVisible, "sf-2"),
            (ScenarioId::InstancesVisible, "sf-3"),
            (ScenarioId::DhcpHostsPresent, "sf-1"),
            (ScenarioId::DhcpAbsent, "sf-2"),
            // dhcptest-1 lives on sf-3
            (ScenarioId::Connectivity, "sf-3"),
        ])
    );

    // Scripts are left in place unless cleanup was asked for.
    assert!(!executor.calls().iter().any(|c| matches!(c, Call::Remove { .. })));
}

#[tokio::test]
async fn fail_fast_stops_at_the_first_failing_host() {
    let inventory = support::inventory();
    let facts = support::facts();
    let cfg = Config::default();
    let executor = RecordingExecutor::new().failing(ScenarioId::InstancesVisible, "sf-2");

    let report = Harness::new(Box::new(executor.clone()), &inventory, &facts, &cfg)
        .run(&ScenarioId::ALL)
        .await
        .unwrap();

    assert_eq!(
        executor.executed(),
        pairs(&[
            (ScenarioId::InstancesVisible, "sf-1"),
            (ScenarioId::InstancesVisible, "sf-2"),
        ])
    );
    assert!(!report.all_passed());
    assert!(report.aborted());
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].outcomes.len(), 2);
    assert_eq!(
        report.skipped,
        vec![
            ScenarioId::DhcpHostsPresent,
            ScenarioId::DhcpAbsent,
            ScenarioId::Connectivity
        ]
    );

    let failures = report.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].0, ScenarioId::InstancesVisible);
    assert_eq!(failures[0].1, "sf-2");
    assert!(failures[0].2.contains("observed 0, expected 1"));
}

#[tokio::test]
async fn failure_in_the_last_scenario_skips_nothing() {
    let inventory = support::inventory();
    let facts = support::facts();
    let cfg = Config::default();
    let executor = RecordingExecutor::new().failing(ScenarioId::Connectivity, "sf-3");

    let report = Harness::new(Box::new(executor.clone()), &inventory, &facts, &cfg)
        .run(&ScenarioId::ALL)
        .await
        .unwrap();

    assert!(!report.all_passed());
    assert!(report.skipped.is_empty());
    assert_eq!(executor.executed().len(), 6);
}

#[tokio::test]
async fn keep_going_reports_every_failure() {
    let inventory = support::inventory();
    let facts = support::facts();
    let cfg = keep_going();
    let executor = RecordingExecutor::new()
        .failing(ScenarioId::InstancesVisible, "sf-2")
        .failing(ScenarioId::DhcpAbsent, "sf-2");

    let report = Harness::new(Box::new(executor.clone()), &inventory, &facts, &cfg)
        .run(&ScenarioId::ALL)
        .await
        .unwrap();

    assert_eq!(executor.executed().len(), 6);
    assert!(report.skipped.is_empty());
    assert!(!report.all_passed());

    let failed: Vec<(ScenarioId, &str)> = report
        .failures()
        .into_iter()
        .map(|(id, host, _)| (id, host))
        .collect();
    assert_eq!(
        failed,
        vec![
            (ScenarioId::InstancesVisible, "sf-2"),
            (ScenarioId::DhcpAbsent, "sf-2")
        ]
    );

    let passed: Vec<ScenarioId> = report
        .results
        .iter()
        .filter(|r| r.passed())
        .map(|r| r.id)
        .collect();
    assert_eq!(
        passed,
        vec![ScenarioId::DhcpHostsPresent, ScenarioId::Connectivity]
    );
}

#[tokio::test]
async fn unreachable_host_fails_without_running_anything() {
    let inventory = support::inventory();
    let facts = support::facts();
    let cfg = keep_going();
    let executor = RecordingExecutor::new().unreachable("sf-2");

    let report = Harness::new(Box::new(executor.clone()), &inventory, &facts, &cfg)
        .run(&ScenarioId::ALL)
        .await
        .unwrap();

    assert!(
        !executor
            .calls()
            .iter()
            .any(|c| c.is_execute() && c.host() == "sf-2")
    );

    let dhcp_absent = report
        .results
        .iter()
        .find(|r| r.id == ScenarioId::DhcpAbsent)
        .unwrap();
    match &dhcp_absent.outcomes[0].verdict {
        Verdict::Failed { reason } => assert!(reason.contains("Connection refused")),
        Verdict::Passed => panic!("unreachable host passed"),
    }
}

#[tokio::test]
async fn cleanup_removes_every_uploaded_script() {
    let inventory = support::inventory();
    let facts = support::facts();
    let cfg = Config {
        cleanup: true,
        ..Config::default()
    };
    let executor = RecordingExecutor::new();

    Harness::new(Box::new(executor.clone()), &inventory, &facts, &cfg)
        .run(&ScenarioId::ALL)
        .await
        .unwrap();

    let calls = executor.calls();
    let uploads: Vec<(&str, &str)> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Upload { host, path } => Some((host.as_str(), path.as_str())),
            _ => None,
        })
        .collect();
    let removes: Vec<(&str, &str)> = calls
        .iter()
        .filter_map(|c| match c {
            Call::Remove { host, path } => Some((host.as_str(), path.as_str())),
            _ => None,
        })
        .collect();

    assert_eq!(uploads.len(), 6);
    assert_eq!(uploads, removes);
}

#[tokio::test]
async fn selection_keeps_catalogue_order() {
    let inventory = support::inventory();
    let facts = support::facts();
    let cfg = Config::default();
    let executor = RecordingExecutor::new();

    let report = Harness::new(Box::new(executor.clone()), &inventory, &facts, &cfg)
        .run(&[
            ScenarioId::Connectivity,
            ScenarioId::DhcpHostsPresent,
            ScenarioId::Connectivity,
        ])
        .await
        .unwrap();

    assert!(report.all_passed());
    assert_eq!(
        executor.executed(),
        pairs(&[
            (ScenarioId::DhcpHostsPresent, "sf-1"),
            (ScenarioId::Connectivity, "sf-3"),
        ])
    );
}

#[tokio::test]
async fn elevation_follows_tooling() {
    let inventory = support::inventory();
    let facts = support::facts();
    let mut cfg = Config::default();
    cfg.tooling.elevate = false;
    let executor = RecordingExecutor::new();

    Harness::new(Box::new(executor.clone()), &inventory, &facts, &cfg)
        .run(&[ScenarioId::DhcpAbsent])
        .await
        .unwrap();

    assert_eq!(
        executor.calls().last(),
        Some(&Call::Execute {
            host: "sf-2".to_string(),
            path: executor.scripts()[0].0.clone(),
            elevate: false,
        })
    );
}

#[tokio::test]
async fn uploaded_scripts_carry_the_facts() {
    let inventory = support::inventory();
    let facts = support::facts();
    let cfg = Config::default();
    let executor = RecordingExecutor::new();

    Harness::new(Box::new(executor.clone()), &inventory, &facts, &cfg)
        .run(&[ScenarioId::DhcpHostsPresent, ScenarioId::DhcpAbsent])
        .await
        .unwrap();

    let scripts = executor.scripts();
    assert_eq!(scripts.len(), 2);

    let (path, present) = &scripts[0];
    assert!(path.starts_with("/tmp/sfcheck-dhcp-hosts-present-"));
    assert!(present.starts_with("#!/bin/bash\n"));
    assert!(present.contains(&format!("/srv/shakenfist/dhcp/{NETWORK_UUID}/hosts")));
    assert!(present.contains("10.0.0.5"));
    assert!(present.contains("10.0.0.6"));

    let (_, absent) = &scripts[1];
    assert!(absent.contains(&format!("/srv/shakenfist/dhcp/{NETWORK_UUID}/config")));
    assert!(absent.contains("gateway:10.0.0.1"));
}

#[tokio::test]
async fn progress_is_reported_per_host() {
    let inventory = support::inventory();
    let facts = support::facts();
    let cfg = Config::default();
    let seen: Arc<Mutex<Vec<String>>> = Arc::default();
    let sink = Arc::clone(&seen);

    Harness::new(Box::new(RecordingExecutor::new()), &inventory, &facts, &cfg)
        .on_host_started(Box::new(move |id: ScenarioId, host: &Host| {
            sink.lock().unwrap().push(format!("{id}@{}", host.name));
        }))
        .run(&[ScenarioId::InstancesVisible])
        .await
        .unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "instances-visible@sf-1",
            "instances-visible@sf-2",
            "instances-visible@sf-3"
        ]
    );
}

#[tokio::test]
async fn facts_naming_unknown_nodes_are_rejected_up_front() {
    let inventory = support::inventory();
    let facts = Facts::from_json(
        r#"{
            "network": { "uuid": "87c15186-5f73-4947-a9fb-2183c4951efc", "netblock": "10.0.0.0/24" },
            "instances": [
                { "name": "dhcptest-1", "address": "10.0.0.5", "node": "sf-9", "console_port": 30001 },
                { "name": "dhcptest-2", "address": "10.0.0.6", "node": "sf-1", "console_port": 30002 }
            ]
        }"#,
    )
    .unwrap();
    let cfg = Config::default();
    let executor = RecordingExecutor::new();

    let result = Harness::new(Box::new(executor.clone()), &inventory, &facts, &cfg)
        .run(&ScenarioId::ALL)
        .await;

    assert!(matches!(result, Err(HarnessError::Facts(_))));
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn empty_selection_is_an_error() {
    let inventory = support::inventory();
    let facts = support::facts();
    let cfg = Config::default();

    let result = Harness::new(Box::new(RecordingExecutor::new()), &inventory, &facts, &cfg)
        .run(&[])
        .await;

    assert!(matches!(result, Err(HarnessError::NothingToRun)));
}
