/*
 * Boid Flocking Simulation - Headless Driver
 *
 * Spawns a flock, runs the fixed-timestep update loop for a number of frames
 * and logs flock statistics as it goes. Useful for tuning parameters and for
 * profiling the update without a renderer attached.
 *
 * Logging goes through tracing; set RUST_LOG (e.g. RUST_LOG=boids=debug) to see
 * every step.
 */

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use boids::{spawn_flock, Boid, FlockSimulator, ParamsError, SimulationParams, DEFAULT_TIME_STEP};
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Headless boid flocking simulation
#[derive(Parser, Debug)]
#[command(name = "boids")]
#[command(about = "Run the boid flocking simulation without a renderer", long_about = None)]
struct Args {
    /// JSON parameter file (missing fields use defaults)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of boids
    #[arg(short, long)]
    boids: Option<usize>,

    /// Number of frames to simulate
    #[arg(short, long, default_value_t = 600)]
    frames: u64,

    /// Frame delta in seconds
    #[arg(long, default_value_t = DEFAULT_TIME_STEP)]
    dt: f32,

    /// Seed for the initial flock
    #[arg(short, long, default_value_t = 0)]
    seed: u64,

    /// Compute steering on the rayon thread pool
    #[arg(long)]
    parallel: bool,

    /// Use the spatial grid for neighbor lookups
    #[arg(long)]
    grid: bool,

    /// Log flock statistics every N frames (0 = only at the end)
    #[arg(short, long, default_value_t = 60)]
    report_every: u64,

    /// Write the effective parameters to this file and exit
    #[arg(long)]
    dump_config: Option<PathBuf>,
}

// Everything the driver owns between frames
struct Model {
    boids: Vec<Boid>,
    simulator: FlockSimulator,
    total_step_time: Duration,
}

fn resolve_params(args: &Args) -> Result<SimulationParams, Box<dyn Error>> {
    let mut params = match &args.config {
        Some(path) => SimulationParams::load(path)?,
        None => SimulationParams::default(),
    };

    if let Some(count) = args.boids {
        params.num_boids = count;
    }
    params.enable_parallel |= args.parallel;
    params.enable_spatial_grid |= args.grid;

    params.validate()?;
    Ok(params)
}

fn model(params: SimulationParams, seed: u64) -> Result<Model, ParamsError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let boids = spawn_flock(&params, &mut rng);
    let simulator = FlockSimulator::new(params)?;

    Ok(Model {
        boids,
        simulator,
        total_step_time: Duration::ZERO,
    })
}

fn update(model: &mut Model, delta_time: f32) {
    model.simulator.step(&mut model.boids, delta_time);
    model.total_step_time += model.simulator.debug_info.step_time;
}

// Mean step time over `frames` steps; the frame counter is u64, so divide in nanoseconds
fn average_step_time(total: Duration, frames: u64) -> Duration {
    let nanos = total.as_nanos() / u128::from(frames.max(1));
    Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
}

fn report(model: &Model) {
    let info = &model.simulator.debug_info;
    info!(
        frame = info.frame,
        boids = info.boid_count,
        mean_neighbors = info.mean_neighbors,
        mean_speed = info.mean_speed,
        polarization = info.polarization,
        centroid = ?info.centroid,
        step_us = info.step_time.as_micros() as u64,
        "Flock state"
    );
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let params = resolve_params(&args)?;

    if let Some(path) = &args.dump_config {
        params.save(path)?;
        info!(path = %path.display(), "Wrote parameters");
        return Ok(());
    }

    let mut model = model(params, args.seed)?;
    info!(frames = args.frames, dt = args.dt, seed = args.seed, "Starting simulation");

    let started = Instant::now();
    for frame in 1..=args.frames {
        update(&mut model, args.dt);

        if args.report_every > 0 && frame % args.report_every == 0 {
            report(&model);
        }
    }

    report(&model);
    let average = average_step_time(model.total_step_time, model.simulator.debug_info.frame);
    info!(
        wall_ms = started.elapsed().as_millis() as u64,
        avg_step_us = average.as_micros() as u64,
        "Simulation finished"
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_step_time_handles_long_runs() {
        let frames = 1u64 << 32;
        let total = Duration::from_micros(3 * frames);
        assert_eq!(average_step_time(total, frames), Duration::from_micros(3));
    }

    #[test]
    fn average_step_time_with_no_frames_is_the_total() {
        let total = Duration::from_millis(7);
        assert_eq!(average_step_time(total, 0), total);
    }

    #[test]
    fn model_rejects_invalid_params() {
        let params = SimulationParams { max_speed: -1.0, ..Default::default() };
        assert!(model(params, 0).is_err());
    }
}
