#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that replays a Warden level headlessly.

mod level;
mod simulation;

use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use warden_navigation::{AssemblyConfig, LocalTopology};
use warden_system_movement::{Movement, MovementConfig};

use crate::{level::LevelDescription, simulation::Simulation};

/// Headless runner for Warden enemy navigation.
#[derive(Debug, Parser)]
#[command(name = "warden", version, about)]
struct CliArgs {
    /// Level description in TOML format.
    #[arg(long, value_name = "PATH", default_value = "levels/two_rooms.toml")]
    level: PathBuf,
    /// Number of fixed ticks to simulate.
    #[arg(long, default_value_t = 300)]
    ticks: u32,
    /// Duration of a single tick in milliseconds.
    #[arg(long = "tick-ms", default_value_t = 50)]
    tick_ms: u64,
    /// How enemies connect their own waypoints before merging meshes.
    #[arg(long, value_enum, default_value_t = TopologyArg::Reachable)]
    topology: TopologyArg,
    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum TopologyArg {
    Reachable,
    Ring,
}

impl From<TopologyArg> for LocalTopology {
    fn from(value: TopologyArg) -> Self {
        match value {
            TopologyArg::Reachable => LocalTopology::Reachable,
            TopologyArg::Ring => LocalTopology::Ring,
        }
    }
}

/// Entry point for the Warden command-line interface.
fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(&args.log_level)?;

    if args.tick_ms == 0 {
        bail!("--tick-ms must be greater than zero");
    }

    let level = LevelDescription::load(&args.level)?;
    let movement = Movement::new(
        MovementConfig::default(),
        AssemblyConfig::new(args.topology.into()),
    );
    let mut simulation =
        Simulation::new(&level, movement, Duration::from_millis(args.tick_ms));
    info!(
        level = %args.level.display(),
        enemies = level.enemies.len(),
        ticks = args.ticks,
        "simulation started"
    );

    let mut traces = Vec::new();
    for _ in 0..args.ticks {
        traces = simulation.step();
    }

    for state in &traces {
        let mode = state
            .mode
            .map_or_else(|| "unregistered".to_owned(), |mode| mode.to_string());
        println!("enemy {} at {} ({mode})", state.enemy.get(), state.position);
    }
    info!(pickups = simulation.pickups(), "simulation finished");
    Ok(())
}

fn init_logging(default_filter: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("invalid log filter `{default_filter}`"))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()
        .context("failed to install tracing subscriber")
}
