use std::time::{Duration, Instant};

use colored::*;
use tracing::{Instrument, debug, info, warn};

use crate::{
    commands::{RunArgs, load_sources},
    mprint,
    terminal::print::Row,
    terminal::{format, print, spinner},
};
use sfcheck_common::config::{Config, RunPolicy};
use sfcheck_common::inventory::Host;
use sfcheck_common::success;
use sfcheck_core::ScenarioId;
use sfcheck_core::runner::{Harness, RunReport};
use sfcheck_core::transport::{LocalExecutor, RemoteExecutor, SshExecutor};

/// Runs the selected scenarios. Returns whether every one of them passed.
pub async fn run(args: &RunArgs, quiet: u8) -> anyhow::Result<bool> {
    let (inventory, facts) = load_sources(&args.sources)?;

    let mut tooling = inventory.tooling().clone();
    if args.no_elevate {
        tooling.elevate = false;
    }

    let cfg = Config {
        quiet,
        policy: if args.keep_going {
            RunPolicy::KeepGoing
        } else {
            RunPolicy::FailFast
        },
        cleanup: args.cleanup,
        command_timeout: args.timeout,
        tooling,
    };

    let executor: Box<dyn RemoteExecutor> = if args.local {
        info!("Running scripts on this machine");
        Box::new(LocalExecutor::new(cfg.command_timeout))
    } else {
        Box::new(SshExecutor::new(cfg.command_timeout).with_program(&args.ssh_program))
    };

    info!(
        "Network {} ({}), gateway {}",
        facts.network().uuid,
        facts.network().netblock,
        facts.network().gateway()
    );

    let span = spinner::harness_span();
    let progress_span = span.clone();
    let harness = Harness::new(executor, &inventory, &facts, &cfg).on_host_started(Box::new(
        move |scenario: ScenarioId, host: &Host| {
            spinner::report_progress(&progress_span, scenario, host)
        },
    ));

    let start_time = Instant::now();
    let report = harness
        .run(&args.selection.ids())
        .instrument(span)
        .await?;

    run_ends(&report, start_time.elapsed(), &cfg);
    Ok(report.all_passed())
}

fn run_ends(report: &RunReport, total_time: Duration, cfg: &Config) {
    if cfg.quiet > 0 {
        mprint!();
    }

    print::header("Scenario Results", cfg.quiet);
    print_results(report, cfg);
    print_summary(report, total_time, cfg);
}

fn print_results(report: &RunReport, cfg: &Config) {
    if cfg.quiet < 2 {
        for result in &report.results {
            if result.outcomes.is_empty() {
                print::tree(result.id.as_str(), &format::no_hosts());
            }
            for outcome in &result.outcomes {
                let name = format!("{} @ {}", result.id, outcome.host);
                print::tree(&name, &format::outcome_to_details(outcome));
            }
        }
        mprint!();
    }

    let mut rows: Vec<Row> = report
        .results
        .iter()
        .map(|r| (r.id.to_string(), format::scenario_status(r)))
        .collect();
    rows.extend(report.skipped.iter().map(|id| (id.to_string(), format::skipped())));
    print::aligned(&rows);

    if report.aborted() {
        warn!("Stopped at the first failure, rerun with --keep-going to see the rest");
    }
    for (id, host, reason) in report.failures() {
        debug!("{id} failed on {host}: {reason}");
    }
}

fn print_summary(report: &RunReport, total_time: Duration, cfg: &Config) {
    let total_time: ColoredString = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();
    let passed = report.results.iter().filter(|r| r.passed()).count();
    let failed = report.results.len() - passed;

    let output: String = if report.all_passed() {
        format!(
            "{} scenarios passed in {total_time}",
            passed.to_string().bold().green()
        )
    } else {
        format!(
            "{} passed, {} failed, {} skipped in {total_time}",
            passed.to_string().bold().green(),
            failed.to_string().bold().red(),
            report.skipped.len().to_string().bold().yellow()
        )
    };

    match cfg.quiet {
        0 => {
            print::rule();
            print::centerln(&output);
        }
        _ => {
            mprint!();
            if report.all_passed() {
                success!("{}", output);
            } else {
                tracing::error!("{}", output);
            }
        }
    }
}
