use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info, trace, warn};
use particle_life_common::SimulationConfig;
use particle_life_engine::Simulation;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::time::Instant;

/// Headless particle-life runner
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the TOML configuration
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Number of ticks to run (overrides timing.total_ticks)
    #[arg(short, long)]
    ticks: Option<u32>,

    /// Snapshot JSON path (defaults to <base_filename>_snapshots.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("Starting particle-life engine...");

    // --- Load Configuration ---
    let config = SimulationConfig::load(&args.config)?;
    let total_ticks = args.ticks.unwrap_or(config.timing.total_ticks);
    let record_interval = config.timing.record_interval_ticks;
    let save_snapshots = config.output.save_snapshots;
    let output_path = args
        .output
        .unwrap_or_else(|| PathBuf::from(format!("{}_snapshots.json", config.output.base_filename)));

    if config.physics.parallel {
        info!("Using {} Rayon threads for the force pass.", rayon::current_num_threads());
    }

    // --- Initialize Simulation ---
    let mut sim = Simulation::new(config)?;
    debug!("Simulation Parameters: {:#?}", sim.params());

    info!("Starting simulation loop for {} ticks...", total_ticks);
    let start_time = Instant::now();
    let mut previous_print_time = start_time;
    sim.record_snapshot();

    for tick in 0..total_ticks {
        let tick_start = Instant::now();
        sim.tick()
            .with_context(|| format!("Simulation tick {} failed", tick + 1))?;
        let tick_duration = tick_start.elapsed();

        let print_interval_secs = 5.0;
        let should_print_status = previous_print_time.elapsed().as_secs_f64() >= print_interval_secs;
        let is_record_tick = (tick + 1) % record_interval == 0;
        let is_last_tick = tick + 1 == total_ticks;

        if is_record_tick || is_last_tick {
            sim.record_snapshot();
        }

        if should_print_status || is_record_tick || is_last_tick {
            info!(
                "Tick [{}/{}] | Particles: {} | Tick Time: {:6.2} ms | Elapsed: {:.2} s",
                tick + 1,
                total_ticks,
                sim.particle_count(),
                tick_duration.as_secs_f64() * 1000.0,
                start_time.elapsed().as_secs_f64()
            );
            previous_print_time = Instant::now();
        } else {
            trace!("Tick [{}/{}] completed in {:.2} ms", tick + 1, total_ticks, tick_duration.as_secs_f64() * 1000.0);
        }
    }

    info!("Simulation finished in {:.3} seconds.", start_time.elapsed().as_secs_f64());

    // --- Save Recorded Snapshots ---
    if save_snapshots {
        let file = File::create(&output_path)
            .with_context(|| format!("Failed to create snapshot file '{}'", output_path.display()))?;
        serde_json::to_writer(BufWriter::new(file), sim.recorded_snapshots())
            .with_context(|| format!("Failed to write snapshots to '{}'", output_path.display()))?;
        info!("{} snapshots saved to {}", sim.recorded_snapshots().len(), output_path.display());
    } else {
        warn!("Skipping snapshot output as per config (save_snapshots is false).");
    }

    Ok(())
}
