use anyhow::Result;
use clap::Parser;
use log::info;

use intersection_sim::simulation::{
    RunningSimulation, RuntimeOptions, SimConfig, SimWorld, MOTION_HZ, SIMULATION_HORIZON,
};

#[derive(Parser)]
#[command(name = "intersection_sim")]
#[command(about = "Adaptive four-way intersection with emergency preemption")]
struct Cli {
    /// Simulated seconds before the run stops
    #[arg(long, default_value_t = SIMULATION_HORIZON)]
    horizon: u32,

    /// Seed for the arrival generator
    #[arg(long)]
    seed: Option<u64>,

    /// Step the world deterministically instead of on real-time threads
    #[arg(long)]
    lockstep: bool,

    /// Simulated seconds per wall-clock second in threaded mode
    #[arg(long, default_value = "1.0")]
    time_scale: f64,

    /// Only simulate vehicles that are already queued
    #[arg(long)]
    no_arrivals: bool,

    /// Motion ticks per simulated second
    #[arg(long, default_value_t = MOTION_HZ)]
    motion_hz: u32,

    /// Log progress every N simulated seconds (0 disables)
    #[arg(long, default_value = "10")]
    summary_every: u32,

    /// Keep new emergencies off approaches crossing one that already has an emergency
    #[arg(long)]
    separate_emergencies: bool,
}

impl Cli {
    fn config(&self) -> SimConfig {
        let mut config = SimConfig {
            horizon: self.horizon,
            motion_hz: self.motion_hz,
            separate_conflicting_emergencies: self.separate_emergencies,
            ..SimConfig::default()
        };
        if self.no_arrivals {
            config.arrival_interval = None;
        }
        config
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn,intersection_sim=info"),
    )
    .init();

    let cli = Cli::parse();
    let config = cli.config();
    let world = match cli.seed {
        Some(seed) => SimWorld::new_with_seed(config, seed)?,
        None => SimWorld::new(config)?,
    };

    if cli.lockstep {
        run_lockstep(world, cli.summary_every)
    } else {
        run_threaded(
            world,
            RuntimeOptions {
                time_scale: cli.time_scale,
                summary_every: cli.summary_every,
            },
        )
    }
}

/// Run to the horizon as fast as possible on the current thread
fn run_lockstep(mut world: SimWorld, summary_every: u32) -> Result<()> {
    info!(
        "Running {}s in lockstep at {} motion ticks per second",
        world.clock.horizon(),
        world.config.motion_hz
    );
    let report = world.run_to_horizon(summary_every);
    info!(
        "Simulation complete: {} passed, {} phases, {} preemptions",
        report.total_discharged, report.phases_served, report.preemptions
    );
    world.print_summary();
    Ok(())
}

/// Run on the clock, controller, motion and arrival threads
fn run_threaded(world: SimWorld, options: RuntimeOptions) -> Result<()> {
    let simulation = RunningSimulation::spawn(world, options)?;
    let shared = simulation.world();
    let report = simulation.join()?;
    info!(
        "Simulation complete: {} passed, {} phases, {} preemptions",
        report.total_discharged, report.phases_served, report.preemptions
    );
    shared.lock()?.print_summary();
    Ok(())
}
