use colored::*;

use crate::terminal::print::{self, Row};
use crate::terminal::colors;
use sfcheck_core::ScenarioId;
use sfcheck_core::scenario::Scenario;

pub fn list(quiet: u8) {
    print::header("Scenarios", quiet);

    let rows: Vec<Row> = ScenarioId::ALL
        .into_iter()
        .map(|id| {
            let target = format!("[{}]", Scenario::target_of(id)).color(colors::ACCENT);
            (id.to_string(), format!("{} {}", id.description(), target).normal())
        })
        .collect();
    print::aligned(&rows);
}
