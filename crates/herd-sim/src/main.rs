//! Herd Simulation Demo
//!
//! Runs the group AI engine over a small sandbox valley: a deer herd, a wolf
//! family and a wandering hunter. Group state changes are logged as they
//! happen, and snapshots of changed groups can be written out at the end.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use herd_core::sandbox::SandboxWorld;
use herd_core::{write_snapshots, Engine, EngineConfig, EngineError, GroupWorld, TickReport};
use herd_types::SimTime;

mod setup;

/// Command line arguments for the demo
#[derive(Parser, Debug)]
#[command(name = "herd_sim")]
#[command(about = "Group AI demo: herds and packs in a sandbox valley")]
struct Args {
    /// Random seed for reproducibility (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated minutes to run
    #[arg(long, default_value_t = 240)]
    minutes: u64,

    /// Hour of day the run starts at
    #[arg(long, default_value_t = 6)]
    start_hour: u64,

    /// TOML engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write snapshots of changed groups here when the run ends
    #[arg(long)]
    snapshot_out: Option<PathBuf>,

    /// Seconds the hunter spends at each stop of its round
    #[arg(long, default_value_t = 900)]
    hunter_stop_secs: u64,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "simulation aborted");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), EngineError> {
    let config = match &args.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };
    let seed = args.seed.unwrap_or(config.engine.seed);
    let step_secs = config.ticks.fast_interval_secs.max(1);

    println!("Herd Simulation");
    println!("===============");
    println!("Seed: {}", seed);
    println!("Minutes: {}", args.minutes);
    println!();

    let start = SimTime::from_secs(args.start_hour * 3600);
    let mut world = setup::create_valley(start);
    let mut engine = Engine::with_seed(config, seed);

    let deer = setup::spawn_deer(&mut world);
    let wolves = setup::spawn_wolves(&mut world);
    setup::spawn_hunter(&mut world);

    let herd = engine.create_group("plains_herd", deer)?;
    let pack = engine.create_group("wolf_family", wolves)?;
    println!("Herd {} and pack {} formed", herd, pack);
    println!();

    let total_secs = args.minutes * 60;
    let mut elapsed = 0;
    let mut changes = 0;
    while elapsed <= total_secs {
        setup::walk_hunter(&mut world, elapsed, args.hunter_stop_secs);

        match engine.tick(&mut world) {
            Ok(report) => changes += log_report(&report),
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => tracing::warn!(error = %e, "tick failed"),
        }

        if elapsed > 0 && elapsed % 3600 == 0 {
            print_status(&engine, &world);
        }

        world.advance(step_secs);
        elapsed += step_secs;
    }

    println!();
    println!(
        "Simulation complete. {} group changes, {} emotes.",
        changes,
        world.emotes().len()
    );
    print_status(&engine, &world);

    if let Some(path) = &args.snapshot_out {
        let snapshots = engine.drain_dirty(world.now())?;
        write_snapshots(path, &snapshots)?;
        println!("Wrote {} snapshots to {}", snapshots.len(), path.display());
    }
    Ok(())
}

/// Logs every change in a tick report. Returns how many there were.
fn log_report(report: &TickReport) -> usize {
    for (group, outcome) in &report.changes {
        if let Some((from, to)) = outcome.alertness {
            tracing::info!(at = %report.now, group = %group, %from, %to, "alertness");
        }
        if let Some((from, to)) = outcome.action {
            tracing::info!(at = %report.now, group = %group, %from, %to, "action");
        }
    }
    report.changes.len()
}

fn print_status(engine: &Engine, world: &SandboxWorld) {
    println!("[{}]", world.now());
    for group in engine.groups() {
        println!(
            "  {:<14} {:>2} members  {:<14} {}",
            group.policy().name,
            group.len(),
            group.alertness().to_string(),
            group.action()
        );
    }
}
