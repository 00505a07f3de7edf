use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orbit_sandbox::config::Scenario;
use orbit_sandbox::sim::Simulation;

/// Runs a scenario headless, reporting the controlled body's orbit as it goes.
#[derive(Debug, Parser)]
struct Args {
    /// Scenario file (TOML)
    scenario: PathBuf,
    /// Number of ticks to run
    #[arg(short, long, default_value_t = 2000)]
    steps: usize,
    /// Log the readout every this many ticks
    #[arg(long, default_value_t = 200)]
    report_every: usize,
    /// Start unfrozen even if the scenario says otherwise
    #[arg(long)]
    run: bool,
    /// Overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = match &args.log_level {
        Some(level) => EnvFilter::try_new(level).context("bad --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let scenario = Scenario::load(&args.scenario)
        .with_context(|| format!("loading {}", args.scenario.display()))?;
    let dt = scenario.simulation.time_step;
    let mut simulation = Simulation::from_scenario(&scenario).context("building simulation")?;
    if args.run {
        simulation.set_frozen(false);
    }

    let controlled = simulation.world().body(simulation.controlled())?.label();
    for step in 0..args.steps {
        let report = simulation.tick(dt)?;
        if let Some(id) = report.started {
            info!(plan = %id, time = simulation.time(), "burn started");
        }
        if let Some(id) = report.completed {
            info!(plan = %id, time = simulation.time(), "burn completed");
        }
        if args.report_every > 0 && step % args.report_every == 0 {
            if let Some(readout) = simulation.readout() {
                info!(
                    time = simulation.time(),
                    eccentricity = readout.eccentricity,
                    true_anomaly = readout.true_anomaly,
                    "{controlled}"
                );
            }
        }
    }

    println!("Orbital characteristics for {} at t = {}", controlled, simulation.time());
    match simulation.readout() {
        Some(readout) => println!("{}", readout),
        None => println!("- Not orbiting anything"),
    }
    println!("- Plans remaining: {}", simulation.planner().len());
    Ok(())
}
