use anyhow::Context;
use tracing::info;

use crate::commands::{Selection, Sources, load_sources};
use sfcheck_core::scenario;

/// Prints every selected script to stdout, preceded by a comment naming the
/// hosts it would run on. Nothing is contacted.
pub fn render(sources: &Sources, selection: &Selection) -> anyhow::Result<()> {
    let (inventory, facts) = load_sources(sources)?;
    let scenarios = scenario::prepare_all(&selection.ids(), &facts, inventory.tooling())
        .context("rendering scenario scripts")?;

    for scenario in &scenarios {
        let hosts: Vec<String> = scenario
            .hosts(&inventory, &facts)
            .iter()
            .map(|h| h.to_string())
            .collect();
        info!("Rendered {} for {}", scenario.id, scenario.target);

        println!("# ---- {} ({}) ----", scenario.id, scenario.target);
        println!("# hosts: {}", hosts.join(", "));
        println!("{}", scenario.script);
    }

    Ok(())
}
