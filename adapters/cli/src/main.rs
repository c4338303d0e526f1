#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Shadow Defend scenarios headlessly.

mod scenario;
mod session;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::scenario::{Scenario, BUILTIN_SCENARIO};

/// Command-line arguments accepted by the Shadow Defend binary.
#[derive(Debug, Parser)]
#[command(name = "shadow-defend", about = "Runs a Shadow Defend scenario headlessly")]
struct CliArgs {
    /// Scenario file to run; the bundled scenario is used when omitted.
    scenario: Option<PathBuf>,

    /// Maximum number of simulation ticks.
    #[arg(long, default_value_t = 36_000)]
    ticks: u64,

    /// Start each wave as soon as the previous one is over.
    #[arg(long)]
    auto_start: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,
}

/// Entry point for the Shadow Defend command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("shadow_defend=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let scenario = match &args.scenario {
        Some(path) => Scenario::load(path)
            .with_context(|| format!("failed to load scenario {}", path.display()))?,
        None => Scenario::parse(BUILTIN_SCENARIO).context("bundled scenario is invalid")?,
    };

    let summary = session::run(scenario, args.ticks, args.auto_start);

    if args.json {
        let json =
            serde_json::to_string_pretty(&summary).context("failed to serialise summary")?;
        println!("{json}");
    } else {
        let status = summary
            .status
            .map_or_else(|| "unknown".to_owned(), |status| status.to_string());
        println!("status: {status}");
        println!("level: {}", summary.level);
        match summary.wave {
            Some(wave) => println!("wave: {wave}"),
            None => println!("wave: -"),
        }
        println!("lives: {}", summary.lives);
        println!("cash: {}", summary.cash);
        println!(
            "waves: {} completed, {} failed",
            summary.waves_completed, summary.waves_failed
        );
        println!(
            "slicers: {} destroyed, {} escaped",
            summary.slicers_destroyed, summary.slicers_escaped
        );
        println!(
            "defenses: {} placed, {} requests rejected",
            summary.defenses_placed, summary.rejections
        );
        println!("ticks: {}", summary.ticks);
    }

    Ok(())
}
