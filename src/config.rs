use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::controller::{SlidingModeController, SwitchingLaw};
use crate::params::{ensure_finite, ensure_positive, PlantParams, SmcParams};
use crate::reference::SineReference;
use crate::SmcError;

/// Which switching laws to simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum LawSelection {
    Sign,
    Saturation,
    Both,
}

/// Source of the desired velocity handed to the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum VelocitySource {
    /// Backward difference of the desired angle (reproduces the classic loop)
    FiniteDifference,
    /// Exact derivative of the reference
    Analytic,
}

/// Runtime configuration for a tracking run or comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Fixed step shared by plant, controller and time grid [s]
    pub dt: f64,
    /// Simulated horizon [s]
    pub total_time: f64,
    /// Link length [m]
    pub length: f64,
    /// Reference amplitude [rad]
    pub amplitude: f64,
    /// Reference frequency [Hz]
    pub frequency: f64,
    /// Sliding surface slope
    pub lambda: f64,
    /// Switching gain
    pub k: f64,
    /// Boundary-layer width for the saturation law
    pub epsilon: f64,
    pub laws: LawSelection,
    pub velocity_source: VelocitySource,
    /// Initial joint angle [rad]
    pub initial_angle: f64,
    /// Initial joint velocity [rad/s]
    pub initial_velocity: f64,
    /// Std-dev of additive angle measurement noise [rad], 0 disables it
    pub sigma_noise: f64,
    /// RNG seed for measurement noise
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.01,
            total_time: 50.0,
            length: 1.0,
            amplitude: 0.5,
            frequency: 0.2,
            lambda: 10.0,
            k: 5.0,
            epsilon: 0.1,
            laws: LawSelection::Both,
            velocity_source: VelocitySource::FiniteDifference,
            initial_angle: 0.0,
            initial_velocity: 0.0,
            sigma_noise: 0.0,
            seed: 42,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self, SmcError> {
        let cfg: SimConfig = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_path(path: &Path) -> Result<Self, SmcError> {
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn validate(&self) -> Result<(), SmcError> {
        self.plant_params()?;
        self.smc_params()?;
        self.reference()?;
        if self.uses_saturation() {
            SwitchingLaw::saturation(self.epsilon)?;
        }
        if !self.total_time.is_finite() || self.total_time < 0.0 {
            return Err(SmcError::InvalidConfig(format!(
                "total_time must be finite and >= 0, got {}",
                self.total_time
            )));
        }
        ensure_grid(self.dt, self.total_time)?;
        ensure_finite("initial_angle", self.initial_angle)?;
        ensure_finite("initial_velocity", self.initial_velocity)?;
        if !self.sigma_noise.is_finite() || self.sigma_noise < 0.0 {
            return Err(SmcError::InvalidConfig(format!(
                "sigma_noise must be finite and >= 0, got {}",
                self.sigma_noise
            )));
        }
        Ok(())
    }

    /// Number of grid points, `ceil(total_time / dt)`
    pub fn steps(&self) -> usize {
        (self.total_time / self.dt).ceil() as usize
    }

    pub fn plant_params(&self) -> Result<PlantParams, SmcError> {
        PlantParams::new(self.length, self.dt)
    }

    pub fn smc_params(&self) -> Result<SmcParams, SmcError> {
        SmcParams::new(self.lambda, self.k, self.dt)
    }

    pub fn reference(&self) -> Result<SineReference, SmcError> {
        SineReference::new(self.amplitude, self.frequency)
    }

    /// Switching laws selected by `laws`, sign first
    pub fn switching_laws(&self) -> Result<Vec<SwitchingLaw>, SmcError> {
        let mut laws = Vec::with_capacity(2);
        if matches!(self.laws, LawSelection::Sign | LawSelection::Both) {
            laws.push(SwitchingLaw::Sign);
        }
        if self.uses_saturation() {
            laws.push(SwitchingLaw::saturation(self.epsilon)?);
        }
        Ok(laws)
    }

    pub fn controller(&self, law: SwitchingLaw) -> Result<SlidingModeController, SmcError> {
        SlidingModeController::new(self.smc_params()?, law)
    }

    fn uses_saturation(&self) -> bool {
        matches!(self.laws, LawSelection::Saturation | LawSelection::Both)
    }
}

/// Reject a step that does not divide the horizon into a usable grid
fn ensure_grid(dt: f64, total_time: f64) -> Result<(), SmcError> {
    ensure_positive("dt", dt)?;
    if total_time / dt > u32::MAX as f64 {
        return Err(SmcError::InvalidConfig(format!(
            "total_time / dt = {} exceeds the supported step count",
            total_time / dt
        )));
    }
    Ok(())
}
