use std::time::Duration;

use colored::*;
use sfcheck_core::runner::{HostOutcome, ScenarioResult, Verdict};

use crate::terminal::colors;
use crate::terminal::print::Row;

pub fn verdict(v: &Verdict) -> ColoredString {
    match v {
        Verdict::Passed => "PASSED".color(colors::PASSED).bold(),
        Verdict::Failed { .. } => "FAILED".color(colors::FAILED).bold(),
    }
}

pub fn scenario_status(result: &ScenarioResult) -> ColoredString {
    if result.passed() {
        "PASSED".color(colors::PASSED).bold()
    } else {
        "FAILED".color(colors::FAILED).bold()
    }
}

pub fn skipped() -> ColoredString {
    "SKIPPED".color(colors::SKIPPED).bold()
}

pub fn duration(d: Duration) -> ColoredString {
    format!("{:.2}s", d.as_secs_f64()).yellow()
}

/// Details for a scenario that found nothing to run on.
pub fn no_hosts() -> Vec<Row> {
    vec![
        ("Result".to_string(), "FAILED".color(colors::FAILED).bold()),
        ("Reason".to_string(), "no hosts to run on".color(colors::FAILED)),
    ]
}

/// Tree details for one host outcome.
pub fn outcome_to_details(outcome: &HostOutcome) -> Vec<Row> {
    let mut details: Vec<Row> = vec![("Result".to_string(), verdict(&outcome.verdict))];

    if let Verdict::Failed { reason } = &outcome.verdict {
        details.push(("Reason".to_string(), reason.as_str().color(colors::FAILED)));
    }

    for report in &outcome.reports {
        let color = if report.passed() {
            colors::PASSED
        } else {
            colors::FAILED
        };
        let value = format!(
            "{} (seen {}, want {})",
            report.name, report.observed, report.expected
        )
        .color(color);
        details.push(("Check".to_string(), value));
    }

    if let Some(ping) = &outcome.ping {
        let value = format!(
            "{}/{} received, {}% loss",
            ping.received, ping.transmitted, ping.loss_percent
        )
        .color(colors::ADDRESS);
        details.push(("Ping".to_string(), value));
    }

    details.push(("Took".to_string(), duration(outcome.duration)));
    details
}
