//! GraphSLAM Simulator CLI
//!
//! Generate synthetic worlds, estimate them with Graph SLAM and report how
//! close the estimate is to ground truth.

use anyhow::{bail, Context};
use clap::Parser;
use graphslam_core::{NoiseModel, SlamConfig};
use graphslam_sim::{log_results, run_batch, run_estimation, EstimationExport};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// GraphSLAM simulation CLI
#[derive(Parser, Debug)]
#[command(name = "graphslam-sim")]
#[command(about = "Simulate a 2D world and estimate it with Graph SLAM", long_about = None)]
struct Args {
    /// Number of poses in the trajectory
    #[arg(short = 'n', long, default_value = "20")]
    steps: usize,

    /// Number of landmarks
    #[arg(short, long, default_value = "5")]
    landmarks: usize,

    /// Side length of the square world
    #[arg(short, long, default_value = "100.0")]
    world_size: f64,

    /// Landmark sensing range (per axis)
    #[arg(short, long, default_value = "50.0")]
    range: f64,

    /// Measurement noise scale
    #[arg(long, default_value = "2.0")]
    measurement_noise: f64,

    /// Motion noise scale
    #[arg(long, default_value = "2.0")]
    motion_noise: f64,

    /// Length of each move in the random walk [default: 20, at most half the world size]
    #[arg(long)]
    distance: Option<f64>,

    /// Noise distribution (uniform, gaussian)
    #[arg(long, default_value = "uniform")]
    noise_model: NoiseModel,

    /// Master seed for determinism (0 = random from time)
    #[arg(short, long, default_value = "42")]
    seed: u64,

    /// Number of consecutive seeds to run
    #[arg(long, default_value = "1")]
    runs: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// JSON output for CI parsing
    #[arg(long)]
    json: bool,

    /// Export ground truth and estimate of a single run to a JSON file
    #[arg(long)]
    export: Option<String>,
}

impl Args {
    fn config(&self) -> SlamConfig {
        let config = SlamConfig::new(self.steps, self.landmarks)
            .with_world_size(self.world_size)
            .with_measurement_range(self.range)
            .with_noise(self.measurement_noise, self.motion_noise)
            .with_noise_model(self.noise_model);

        match self.distance {
            Some(distance) => config.with_motion_distance(distance),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let config = args.config();
    config.validate_for_generation()?;

    // Determine base seed
    let base_seed = if args.seed == 0 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .context("System clock before UNIX epoch")?
            .as_nanos() as u64
    } else {
        args.seed
    };

    if !args.json {
        info!("GraphSLAM Simulator v{}", env!("CARGO_PKG_VERSION"));
        info!(
            "steps={} landmarks={} world={} range={} noise={}/{} ({})",
            config.steps,
            config.num_landmarks,
            config.world_size,
            config.measurement_range,
            config.measurement_noise,
            config.motion_noise,
            config.noise_model
        );
    }

    // Handle --export mode
    if let Some(export_path) = &args.export {
        if args.runs > 1 {
            bail!("--export only supports a single run");
        }

        let run = run_estimation(&config, base_seed)?;
        log_results(&run);

        EstimationExport::from_run(&run)
            .write_to_file(export_path)
            .with_context(|| format!("Failed to write export to {}", export_path))?;
        info!("Exported run (seed={}) to {}", base_seed, export_path);
        return Ok(());
    }

    // Single run: show the full estimate
    if args.runs == 1 && !args.json {
        match run_estimation(&config, base_seed) {
            Ok(run) => {
                log_results(&run);
                info!("✓ seed={} solved after {} episode(s)", base_seed, run.dataset.episodes);
                return Ok(());
            }
            Err(e) => {
                error!("✗ seed={} FAILED: {}", base_seed, e);
                std::process::exit(1);
            }
        }
    }

    let seeds: Vec<u64> = (0..args.runs as u64)
        .map(|offset| base_seed.wrapping_add(offset))
        .collect();
    let outcomes = run_batch(&config, &seeds).await;
    let failed_count = outcomes.iter().filter(|o| !o.passed).count();

    if args.json {
        let summary = serde_json::json!({
            "total": outcomes.len(),
            "passed": outcomes.len() - failed_count,
            "failed": failed_count,
            "config": config,
            "results": outcomes,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        for outcome in &outcomes {
            match (&outcome.report, &outcome.failure_reason) {
                (Some(report), _) => info!("✓ seed={} {}", outcome.seed, report),
                (None, reason) => error!(
                    "✗ seed={} FAILED: {}",
                    outcome.seed,
                    reason.as_deref().unwrap_or("unknown")
                ),
            }
        }

        if failed_count == 0 {
            info!("All {} runs passed", outcomes.len());
        } else {
            error!("{}/{} runs failed", failed_count, outcomes.len());
        }
    }

    // Exit with proper code for CI
    if failed_count > 0 {
        std::process::exit(1);
    }
    Ok(())
}
