//! SMC arm - sliding-mode tracking control of a single-link arm
//!
//! Simulates a damped single-link arm following a sinusoidal reference
//! under sliding-mode control, comparing a discontinuous sign law against
//! a continuous boundary-layer (saturation) law on the same time grid.

pub mod config;
pub mod controller;
pub mod output;
pub mod params;
pub mod plant;
pub mod reference;
pub mod sim;
pub mod state;

use thiserror::Error;

// Re-export main types
pub use config::{LawSelection, SimConfig, VelocitySource};
pub use controller::{sign, ControlOutput, SlidingModeController, SwitchingLaw};
pub use params::{PlantParams, SmcParams};
pub use plant::SingleLinkArm;
pub use reference::{ReferenceSample, SineReference};
pub use sim::{
    rms_error, run_simulation, run_single, RunId, RunMetrics, SimStep, Simulation,
    SimulationRecord,
};
pub use state::{ArmState, ControllerMemory};

#[derive(Debug, Error)]
pub enum SmcError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("{context} length mismatch: expected {expected}, got {got}")]
    LengthMismatch {
        context: &'static str,
        expected: usize,
        got: usize,
    },
}
