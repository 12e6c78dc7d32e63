use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use smc_arm::output::{create_timestamped_run_dir, write_outputs};
use smc_arm::{run_simulation, LawSelection, SimConfig, VelocitySource};
use tracing::{info, Level};

#[derive(Debug, Parser)]
#[command(author, version, about = "Sliding-mode tracking of a single-link arm")]
struct Cli {
    /// TOML configuration file; CLI flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output base directory; each run gets a timestamped sub-directory
    #[arg(long, default_value = "output-smc-arm")]
    output: PathBuf,

    /// Integration step in seconds
    #[arg(long)]
    dt: Option<f64>,

    /// Simulated horizon in seconds
    #[arg(long)]
    total_time: Option<f64>,

    /// Sliding surface slope
    #[arg(long)]
    lambda: Option<f64>,

    /// Switching gain
    #[arg(long)]
    k: Option<f64>,

    /// Boundary-layer width of the saturation law
    #[arg(long)]
    epsilon: Option<f64>,

    /// Reference amplitude in radians
    #[arg(long)]
    amplitude: Option<f64>,

    /// Reference frequency in Hz
    #[arg(long)]
    frequency: Option<f64>,

    #[arg(long, value_enum)]
    law: Option<LawSelection>,

    #[arg(long, value_enum)]
    velocity_source: Option<VelocitySource>,

    /// Std-dev of angle measurement noise in radians
    #[arg(long)]
    sigma_noise: Option<f64>,

    /// Random seed for measurement noise
    #[arg(long)]
    seed: Option<u64>,

    /// Log at debug level
    #[arg(long, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn resolve_config(&self) -> anyhow::Result<SimConfig> {
        let mut cfg = match &self.config {
            Some(path) => SimConfig::from_toml_path(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => SimConfig::default(),
        };

        if let Some(v) = self.dt {
            cfg.dt = v;
        }
        if let Some(v) = self.total_time {
            cfg.total_time = v;
        }
        if let Some(v) = self.lambda {
            cfg.lambda = v;
        }
        if let Some(v) = self.k {
            cfg.k = v;
        }
        if let Some(v) = self.epsilon {
            cfg.epsilon = v;
        }
        if let Some(v) = self.amplitude {
            cfg.amplitude = v;
        }
        if let Some(v) = self.frequency {
            cfg.frequency = v;
        }
        if let Some(v) = self.law {
            cfg.laws = v;
        }
        if let Some(v) = self.velocity_source {
            cfg.velocity_source = v;
        }
        if let Some(v) = self.sigma_noise {
            cfg.sigma_noise = v;
        }
        if let Some(v) = self.seed {
            cfg.seed = v;
        }

        cfg.validate().context("invalid simulation configuration")?;
        Ok(cfg)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let cfg = cli.resolve_config()?;
    info!(
        dt = cfg.dt,
        total_time = cfg.total_time,
        steps = cfg.steps(),
        "running sliding-mode simulation"
    );

    let records = run_simulation(&cfg)?;
    let run_dir = create_timestamped_run_dir(&cli.output).with_context(|| {
        format!(
            "failed to create run directory under {}",
            cli.output.display()
        )
    })?;
    let (summary, files) = write_outputs(&cfg, &records, &run_dir)?;

    println!("Simulation complete. Steps: {}", summary.steps);
    for run in &summary.runs {
        println!(
            "  {:<10} RMS error: {:.6} rad | max |e|: {:.6} rad | torque TV: {:.1} | switches: {}",
            run.label,
            run.metrics.rms_error,
            run.metrics.max_abs_error,
            run.metrics.torque_total_variation,
            run.metrics.switch_count
        );
    }
    println!("Run directory: {}", files.output_dir.display());
    println!("Comparison CSV: {}", files.comparison_csv_path.display());
    println!("Summary: {}", files.summary_path.display());

    Ok(())
}
