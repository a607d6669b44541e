use colored::*;
use indicatif::ProgressStyle;
use sfcheck_common::inventory::Host;
use sfcheck_core::ScenarioId;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ])
}

/// A span that renders as a spinner while the harness runs inside it.
pub fn harness_span() -> Span {
    let span = info_span!("harness");
    span.pb_set_style(&spinner_style());
    span.pb_set_message("Preparing scenarios...");
    span
}

pub fn report_progress(span: &Span, scenario: ScenarioId, host: &Host) {
    span.pb_set_message(&format!(
        "Running {} on {}...",
        scenario.to_string().green().bold(),
        host.name.bold()
    ));
}
