//! Sign vs Boundary-Layer Tracking Example
//!
//! Runs both switching laws side by side over the same grid, once with the
//! finite-difference desired velocity and once with the analytic one, and
//! prints tracking and chattering metrics for each.

use std::path::PathBuf;

use smc_arm::output::{create_timestamped_run_dir, write_outputs};
use smc_arm::{run_simulation, LawSelection, SimConfig, SimulationRecord, VelocitySource};

fn print_metrics(title: &str, records: &[SimulationRecord]) {
    println!("{title}");
    println!("{}", "=".repeat(title.len()));
    for record in records {
        let m = record.metrics();
        println!("  {}:", record.label);
        println!("    RMS error:        {:.6} rad", m.rms_error);
        println!("    Max |error|:      {:.6} rad", m.max_abs_error);
        println!("    Final error:      {:.6} rad", m.final_error);
        println!("    Torque variation: {:.2}", m.torque_total_variation);
        println!("    Sign reversals:   {}", m.switch_count);
    }
    println!();
}

fn main() -> anyhow::Result<()> {
    println!("Running sliding-mode arm tracking comparison...\n");

    let base_outdir =
        std::env::var("SMC_ARM_OUTPUT_BASE").unwrap_or_else(|_| "output-smc-arm".to_string());

    let config = SimConfig {
        dt: 0.01,
        total_time: 50.0,
        amplitude: 0.5,
        frequency: 0.2,
        lambda: 10.0,
        k: 5.0,
        epsilon: 0.1,
        laws: LawSelection::Both,
        ..Default::default()
    };

    println!("Configuration:");
    println!("  Time step: {}", config.dt);
    println!("  Total steps: {}", config.steps());
    println!("  lambda: {}  k: {}  epsilon: {}", config.lambda, config.k, config.epsilon);
    println!(
        "  Reference: {} * sin(2 pi {} t)",
        config.amplitude, config.frequency
    );
    println!();

    let estimated = run_simulation(&config)?;
    print_metrics("FINITE-DIFFERENCE DESIRED VELOCITY", &estimated);

    let analytic_config = SimConfig {
        velocity_source: VelocitySource::Analytic,
        ..config.clone()
    };
    let analytic = run_simulation(&analytic_config)?;
    print_metrics("ANALYTIC DESIRED VELOCITY", &analytic);

    let run_dir = create_timestamped_run_dir(&PathBuf::from(base_outdir))?;
    let (_, files) = write_outputs(&config, &estimated, &run_dir)?;
    println!("CSV output written to: {}", files.comparison_csv_path.display());
    println!("Done!");

    Ok(())
}
