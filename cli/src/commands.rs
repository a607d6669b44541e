pub mod list;
pub mod render;
pub mod run;
pub mod show;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use sfcheck_common::facts::Facts;
use sfcheck_common::inventory::Inventory;
use sfcheck_core::ScenarioId;

#[derive(Parser)]
#[command(name = "sfcheck")]
#[command(about = "Verifies DHCP placement and instance connectivity on a shakenfist cluster.")]
#[command(version)]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,

    /// More log output (-v debug, -vv trace). SFCHECK_LOG overrides this
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Less terminal output (-q drops headers, -qq drops per-host details)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the scenarios against the cluster
    #[command(alias = "r")]
    Run(RunArgs),
    /// Print the rendered scenario scripts without contacting any host
    Render {
        #[command(flatten)]
        sources: Sources,
        #[command(flatten)]
        selection: Selection,
    },
    /// List the scenarios in the order they run
    #[command(alias = "l")]
    List,
    /// Show the resolved inventory and provisioning facts
    #[command(alias = "s")]
    Show {
        #[command(flatten)]
        sources: Sources,
    },
}

/// Where the cluster description comes from.
#[derive(Args, Debug, Clone)]
pub struct Sources {
    /// Inventory TOML mapping roles to hosts
    #[arg(short, long, env = "SFCHECK_INVENTORY")]
    pub inventory: PathBuf,

    /// Facts JSON written by the provisioning step
    #[arg(short, long, env = "SFCHECK_FACTS")]
    pub facts: PathBuf,
}

#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Only run these scenarios (repeatable); catalogue order is kept
    #[arg(long = "only", value_name = "SCENARIO")]
    pub only: Vec<ScenarioId>,
}

impl Selection {
    pub fn ids(&self) -> Vec<ScenarioId> {
        if self.only.is_empty() {
            ScenarioId::ALL.to_vec()
        } else {
            self.only.clone()
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub sources: Sources,

    #[command(flatten)]
    pub selection: Selection,

    /// Keep running after a failure and report every failing scenario
    #[arg(long)]
    pub keep_going: bool,

    /// Remove the uploaded scripts from the hosts afterwards
    #[arg(long)]
    pub cleanup: bool,

    /// Upper bound for every remote command (e.g. "90s", "5m")
    #[arg(long, value_parser = humantime::parse_duration, default_value = "5m")]
    pub timeout: Duration,

    /// Run the scripts on this machine instead of over ssh
    #[arg(long)]
    pub local: bool,

    /// Do not run the scripts through sudo
    #[arg(long)]
    pub no_elevate: bool,

    /// ssh client binary
    #[arg(long, default_value = "ssh")]
    pub ssh_program: String,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Loads and cross-checks the inventory and facts.
pub fn load_sources(sources: &Sources) -> anyhow::Result<(Inventory, Facts)> {
    let inventory = Inventory::load(&sources.inventory)
        .with_context(|| format!("loading inventory {}", sources.inventory.display()))?;
    let facts = Facts::load(&sources.facts)
        .with_context(|| format!("loading facts {}", sources.facts.display()))?;
    facts
        .check_nodes(&inventory)
        .context("facts do not match the inventory")?;
    Ok((inventory, facts))
}
