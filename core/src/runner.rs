//! # Verification Harness
//!
//! Runs the prepared scenarios one after another, host by host, over a
//! [`RemoteExecutor`]. Nothing runs concurrently: every remote command is
//! awaited before the next one starts.
//!
//! Under [`RunPolicy::FailFast`] the first failing host ends the run and the
//! remaining scenarios are reported as skipped. Under
//! [`RunPolicy::KeepGoing`] everything runs and every failure is collected.

use std::fmt;
use std::time::{Duration, Instant};

use rand::Rng;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use sfcheck_common::config::{Config, RunPolicy};
use sfcheck_common::error::FactsError;
use sfcheck_common::facts::Facts;
use sfcheck_common::inventory::{Host, Inventory};
use sfcheck_common::success;
use sfcheck_protocols::ping::{self, PingSummary};
use sfcheck_protocols::report::{self, CheckReport};

use crate::scenario::{self, Scenario, ScenarioId};
use crate::template::RenderError;
use crate::transport::{ExecOutput, RemoteExecutor};

/// Problems found before any host is contacted.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Facts(#[from] FactsError),

    #[error("no scenarios selected")]
    NothingToRun,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed { reason: String },
}

impl Verdict {
    pub fn passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => f.write_str("passed"),
            Verdict::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Result of one scenario on one host.
#[derive(Debug, Clone)]
pub struct HostOutcome {
    pub host: String,
    pub verdict: Verdict,
    pub reports: Vec<CheckReport>,
    /// Only set for the connectivity scenario, when the console relayed a summary.
    pub ping: Option<PingSummary>,
    pub duration: Duration,
}

impl HostOutcome {
    fn failed(host: &Host, reason: String, duration: Duration) -> Self {
        Self {
            host: host.name.clone(),
            verdict: Verdict::Failed { reason },
            reports: Vec::new(),
            ping: None,
            duration,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub id: ScenarioId,
    pub outcomes: Vec<HostOutcome>,
}

impl ScenarioResult {
    /// A scenario that ran on no host at all did not pass.
    pub fn passed(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(|o| o.verdict.passed())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub results: Vec<ScenarioResult>,
    /// Scenarios never started because an earlier one failed.
    pub skipped: Vec<ScenarioId>,
}

impl RunReport {
    pub fn all_passed(&self) -> bool {
        self.skipped.is_empty() && self.results.iter().all(ScenarioResult::passed)
    }

    pub fn aborted(&self) -> bool {
        !self.skipped.is_empty()
    }

    /// Every failing `(scenario, host, reason)`.
    pub fn failures(&self) -> Vec<(ScenarioId, &str, &str)> {
        let mut failures = Vec::new();
        for result in &self.results {
            if result.outcomes.is_empty() {
                failures.push((result.id, "-", "no hosts to run on"));
            }
            for outcome in &result.outcomes {
                if let Verdict::Failed { reason } = &outcome.verdict {
                    failures.push((result.id, outcome.host.as_str(), reason.as_str()));
                }
            }
        }
        failures
    }
}

type ProgressFn = Box<dyn Fn(ScenarioId, &Host) + Send + Sync>;

pub struct Harness<'a> {
    executor: Box<dyn RemoteExecutor>,
    inventory: &'a Inventory,
    facts: &'a Facts,
    cfg: &'a Config,
    on_host_started: Option<ProgressFn>,
}

impl<'a> Harness<'a> {
    pub fn new(
        executor: Box<dyn RemoteExecutor>,
        inventory: &'a Inventory,
        facts: &'a Facts,
        cfg: &'a Config,
    ) -> Self {
        Self {
            executor,
            inventory,
            facts,
            cfg,
            on_host_started: None,
        }
    }

    /// Called right before a scenario starts on a host.
    pub fn on_host_started(mut self, cb: ProgressFn) -> Self {
        self.on_host_started = Some(cb);
        self
    }

    /// Runs the selected scenarios in catalogue order.
    ///
    /// Errors are reserved for problems found before any host is touched.
    /// Scenario failures are part of the returned [`RunReport`].
    pub async fn run(&self, ids: &[ScenarioId]) -> Result<RunReport, HarnessError> {
        self.facts.check_nodes(self.inventory)?;
        let scenarios = scenario::prepare_all(ids, self.facts, &self.cfg.tooling)?;
        if scenarios.is_empty() {
            return Err(HarnessError::NothingToRun);
        }

        let mut report = RunReport::default();

        for (idx, scenario) in scenarios.iter().enumerate() {
            let result = self.run_scenario(scenario).await;
            let passed = result.passed();
            report.results.push(result);

            if !passed && self.cfg.policy == RunPolicy::FailFast {
                report.skipped = scenarios[idx + 1..].iter().map(|s| s.id).collect();
                if !report.skipped.is_empty() {
                    warn!(
                        "Aborting run, {} scenario(s) not started",
                        report.skipped.len()
                    );
                }
                break;
            }
        }

        Ok(report)
    }

    async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let hosts = scenario.hosts(self.inventory, self.facts);
        info!(
            "Scenario {} on {} ({} host(s)): {}",
            scenario.id,
            scenario.target,
            hosts.len(),
            scenario.id.description()
        );

        let mut result = ScenarioResult {
            id: scenario.id,
            outcomes: Vec::new(),
        };

        if hosts.is_empty() {
            error!("Scenario {} has no hosts to run on", scenario.id);
            return result;
        }

        for host in hosts {
            if let Some(cb) = &self.on_host_started {
                cb(scenario.id, host);
            }

            let outcome = self.run_on_host(scenario, host).await;
            let passed = outcome.verdict.passed();
            match &outcome.verdict {
                Verdict::Passed => success!("{} passed on {}", scenario.id, host),
                Verdict::Failed { reason } => error!("{} failed on {}: {}", scenario.id, host, reason),
            }
            result.outcomes.push(outcome);

            if !passed && self.cfg.policy == RunPolicy::FailFast {
                break;
            }
        }

        result
    }

    async fn run_on_host(&self, scenario: &Scenario, host: &Host) -> HostOutcome {
        let start = Instant::now();
        let path = script_path(&self.cfg.tooling.remote_dir, scenario.id);

        let executed = match self.executor.upload(host, &path, &scenario.script).await {
            Ok(()) => {
                self.executor
                    .execute(host, &path, self.cfg.tooling.elevate)
                    .await
            }
            Err(e) => Err(e),
        };

        if self.cfg.cleanup {
            if let Err(e) = self.executor.remove(host, &path).await {
                warn!("Could not remove {path} from {}: {e}", host.name);
            }
        }

        match executed {
            Ok(output) => judge(scenario.id, host, output, start.elapsed()),
            Err(e) => HostOutcome::failed(host, e.to_string(), start.elapsed()),
        }
    }
}

fn script_path(remote_dir: &str, id: ScenarioId) -> String {
    let suffix: u32 = rand::rng().random();
    format!(
        "{}/sfcheck-{}-{:08x}.sh",
        remote_dir.trim_end_matches('/'),
        id,
        suffix
    )
}

/// Turns a finished script into a verdict. The exit code decides; reports
/// only explain.
fn judge(id: ScenarioId, host: &Host, output: ExecOutput, duration: Duration) -> HostOutcome {
    let reports = report::parse_reports(&output.stdout);
    let ping = match id {
        ScenarioId::Connectivity => ping::parse_summary(&output.stdout),
        _ => None,
    };

    for r in &reports {
        debug!("{} on {}: {}", id, host.name, r);
    }
    if !output.stderr.trim().is_empty() {
        debug!("{} on {} stderr: {}", id, host.name, output.stderr.trim());
    }

    let first_failed = reports.iter().find(|r| !r.passed());
    let verdict = match (output.success(), first_failed) {
        (true, None) => Verdict::Passed,
        (true, Some(r)) => Verdict::Failed {
            reason: format!("script exited 0 but check {r}"),
        },
        (false, Some(r)) => Verdict::Failed {
            reason: format!("check {r}"),
        },
        (false, None) => Verdict::Failed {
            reason: exit_reason(&output),
        },
    };

    // The last relayed summary has to agree with a passing script.
    let verdict = match (id, verdict, &ping) {
        (ScenarioId::Connectivity, Verdict::Passed, None) => Verdict::Failed {
            reason: "no ping summary in console output".to_string(),
        },
        (ScenarioId::Connectivity, Verdict::Passed, Some(summary)) if !summary.is_lossless() => {
            Verdict::Failed {
                reason: format!(
                    "last ping summary shows {}% packet loss",
                    summary.loss_percent
                ),
            }
        }
        (_, verdict, _) => verdict,
    };

    HostOutcome {
        host: host.name.clone(),
        verdict,
        reports,
        ping,
        duration,
    }
}

fn exit_reason(output: &ExecOutput) -> String {
    let status = match output.code {
        Some(code) => format!("script exited with status {code}"),
        None => "script was killed by a signal".to_string(),
    };
    match output.stderr.lines().rev().find(|l| !l.trim().is_empty()) {
        Some(line) => format!("{status}: {}", line.trim()),
        None => status,
    }
}
