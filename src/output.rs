use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use csv::Writer;
use serde::Serialize;

use crate::config::SimConfig;
use crate::controller::SwitchingLaw;
use crate::sim::{RunMetrics, SimulationRecord};
use crate::SmcError;

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub label: String,
    pub law: SwitchingLaw,
    pub metrics: RunMetrics,
    pub csv_path: PathBuf,
}

#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub config: SimConfig,
    pub steps: usize,
    pub runs: Vec<RunSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OutputFiles {
    pub output_dir: PathBuf,
    pub run_csv_paths: Vec<PathBuf>,
    pub comparison_csv_path: PathBuf,
    pub summary_path: PathBuf,
}

pub fn create_timestamped_run_dir(base_dir: &Path) -> Result<PathBuf, SmcError> {
    fs::create_dir_all(base_dir)?;

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    let mut run_dir = base_dir.join(&timestamp);
    let mut counter = 1_u32;

    while run_dir.exists() {
        run_dir = base_dir.join(format!("{timestamp}-{counter:02}"));
        counter += 1;
    }

    fs::create_dir_all(&run_dir)?;
    Ok(run_dir)
}

fn ensure_len(context: &'static str, expected: usize, actual: usize) -> Result<(), SmcError> {
    if expected == actual {
        return Ok(());
    }

    Err(SmcError::LengthMismatch {
        context,
        expected,
        got: actual,
    })
}

fn fmt_f64(value: f64) -> String {
    format!("{value:.10}")
}

/// One row per step, columns named after the `SimStep` fields
pub fn write_record_csv(path: &Path, record: &SimulationRecord) -> Result<(), SmcError> {
    let mut writer = Writer::from_path(path)?;
    for step in &record.steps {
        writer.serialize(step)?;
    }
    writer.flush()?;
    Ok(())
}

/// Time-aligned angle, error and torque of every run
pub fn write_comparison_csv(path: &Path, records: &[SimulationRecord]) -> Result<(), SmcError> {
    let Some(first) = records.first() else {
        return Err(SmcError::InvalidConfig(
            "comparison needs at least one run".to_string(),
        ));
    };
    for record in records {
        ensure_len("comparison run", first.len(), record.len())?;
    }

    let mut header = vec!["time".to_string(), "desired_angle".to_string()];
    for record in records {
        header.push(format!("{}_angle", record.label));
        header.push(format!("{}_error", record.label));
        header.push(format!("{}_torque", record.label));
    }

    let mut writer = Writer::from_path(path)?;
    writer.write_record(&header)?;

    for idx in 0..first.len() {
        let base = &first.steps[idx];
        let mut row = vec![fmt_f64(base.time), fmt_f64(base.desired_angle)];
        for record in records {
            let step = &record.steps[idx];
            row.push(fmt_f64(step.angle));
            row.push(fmt_f64(step.error));
            row.push(fmt_f64(step.torque));
        }
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn write_summary(path: &Path, summary: &Summary) -> Result<(), SmcError> {
    let data = serde_json::to_string_pretty(summary)?;
    fs::write(path, data)?;
    Ok(())
}

/// Write every artifact of a finished simulation into `output_dir`
pub fn write_outputs(
    config: &SimConfig,
    records: &[SimulationRecord],
    output_dir: &Path,
) -> Result<(Summary, OutputFiles), SmcError> {
    fs::create_dir_all(output_dir)?;

    let mut runs = Vec::with_capacity(records.len());
    let mut run_csv_paths = Vec::with_capacity(records.len());
    for record in records {
        let csv_path = output_dir.join(format!("{}.csv", record.label));
        write_record_csv(&csv_path, record)?;
        runs.push(RunSummary {
            label: record.label.clone(),
            law: record.law,
            metrics: record.metrics(),
            csv_path: csv_path.clone(),
        });
        run_csv_paths.push(csv_path);
    }

    let files = OutputFiles {
        output_dir: output_dir.to_path_buf(),
        run_csv_paths,
        comparison_csv_path: output_dir.join("comparison.csv"),
        summary_path: output_dir.join("summary.json"),
    };
    write_comparison_csv(&files.comparison_csv_path, records)?;

    let summary = Summary {
        config: config.clone(),
        steps: config.steps(),
        runs,
    };
    write_summary(&files.summary_path, &summary)?;

    Ok((summary, files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::run_simulation;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("smc-arm-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn short_config() -> SimConfig {
        SimConfig {
            total_time: 0.5,
            ..Default::default()
        }
    }

    #[test]
    fn test_write_outputs() {
        let cfg = short_config();
        let records = run_simulation(&cfg).unwrap();
        let dir = scratch_dir("outputs");

        let (summary, files) = write_outputs(&cfg, &records, &dir).unwrap();
        assert_eq!(summary.runs.len(), 2);
        assert_eq!(summary.steps, 50);
        assert!(files.comparison_csv_path.exists());
        assert!(files.summary_path.exists());

        let sign_csv = fs::read_to_string(dir.join("sign.csv")).unwrap();
        let mut lines = sign_csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "time,desired_angle,desired_velocity,angle,velocity,error,torque,surface,tip_x,tip_y"
        );
        assert_eq!(lines.count(), 50);

        let comparison = fs::read_to_string(&files.comparison_csv_path).unwrap();
        let header = comparison.lines().next().unwrap();
        assert_eq!(
            header,
            "time,desired_angle,sign_angle,sign_error,sign_torque,\
             saturation_angle,saturation_error,saturation_torque"
        );

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&files.summary_path).unwrap()).unwrap();
        assert_eq!(json["runs"][1]["law"]["kind"], "saturation");
        assert_eq!(json["config"]["dt"], 0.01);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_comparison_rejects_mismatched_lengths() {
        let cfg = short_config();
        let mut records = run_simulation(&cfg).unwrap();
        records[1].steps.pop();
        let dir = scratch_dir("mismatch");
        fs::create_dir_all(&dir).unwrap();

        let err = write_comparison_csv(&dir.join("comparison.csv"), &records).unwrap_err();
        assert!(matches!(err, SmcError::LengthMismatch { expected: 50, got: 49, .. }));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_timestamped_dirs_are_unique() {
        let base = scratch_dir("stamps");
        let a = create_timestamped_run_dir(&base).unwrap();
        let b = create_timestamped_run_dir(&base).unwrap();
        assert_ne!(a, b);
        assert!(a.is_dir() && b.is_dir());
        fs::remove_dir_all(&base).unwrap();
    }
}
