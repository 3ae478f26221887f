// SPDX-License-Identifier: MIT OR Apache-2.0
//! `OrdoPlay` behavior runner - headless host for behavior graphs
//!
//! Loads a RON scenario (scene entities, their behavior graphs and scripted
//! collisions), ticks it in play mode and prints the final scene and graph
//! state.

mod report;
mod scenario;

use clap::{Parser, Subcommand};
use report::{Report, ReportFormat};
use scenario::{RunnerError, Scenario};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Run behavior graph scenarios without the editor
#[derive(Parser, Debug)]
#[command(name = "ordoplay_behavior", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Tick a scenario and print the final state
    Run {
        /// Path to the scenario RON file
        scenario: PathBuf,
        /// Ticks to run, overriding the scenario
        #[arg(short, long)]
        ticks: Option<u32>,
        /// Seconds per tick, overriding the scenario
        #[arg(long)]
        dt: Option<f32>,
        /// Report encoding
        #[arg(short, long, value_enum, default_value_t = ReportFormat::Ron)]
        format: ReportFormat,
    },
    /// Print a sample scenario
    Sample,
}

fn init_tracing(default_level: &str) {
    // RUST_LOG wins over the scenario's hint
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(
    scenario: Result<Scenario, RunnerError>,
    ticks: Option<u32>,
    dt: Option<f32>,
    format: ReportFormat,
) -> Result<(), RunnerError> {
    let mut scenario = scenario?;
    if let Some(dt) = dt {
        scenario.delta_time = dt;
    }
    let ticks = ticks.unwrap_or(scenario.ticks);

    let mut sim = scenario.build()?;
    let stats = sim.run(ticks);
    if stats.degraded > 0 || stats.refused > 0 {
        tracing::warn!(
            degraded = stats.degraded,
            refused = stats.refused,
            "Some nodes did not run cleanly"
        );
    }

    println!("{}", Report::capture(&sim, stats).render(format)?);
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run {
            scenario,
            ticks,
            dt,
            format,
        } => {
            let loaded = Scenario::load(&scenario);
            let level = loaded
                .as_ref()
                .map_or("info", |s| s.settings.log_level.as_str());
            init_tracing(level);
            tracing::info!("Starting OrdoPlay behavior runner v{}", env!("CARGO_PKG_VERSION"));
            run(loaded, ticks, dt, format)
        }
        Command::Sample => {
            init_tracing("warn");
            Scenario::sample().to_ron().map(|text| println!("{text}"))
        }
    };

    if let Err(e) = result {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}
