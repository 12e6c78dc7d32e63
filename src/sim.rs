//! Simulation driver for sliding-mode tracking
//!
//! Owns one plant, one controller memory and one record per run, stored
//! side by side in an arena indexed by [`RunId`]. All runs advance over the
//! same time grid in lockstep; nothing is shared between them.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{SimConfig, VelocitySource};
use crate::controller::{sign, SlidingModeController, SwitchingLaw};
use crate::plant::SingleLinkArm;
use crate::reference::{ReferenceSample, SineReference};
use crate::state::{ArmState, ControllerMemory};
use crate::SmcError;

/// Handle to one run inside a [`Simulation`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(usize);

impl RunId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Recorded values for one time step
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimStep {
    pub time: f64,
    pub desired_angle: f64,
    pub desired_velocity: f64,
    /// Arm angle after the plant update
    pub angle: f64,
    pub velocity: f64,
    /// `angle - desired_angle`
    pub error: f64,
    pub torque: f64,
    pub surface: f64,
    pub tip_x: f64,
    pub tip_y: f64,
}

/// Time series of one run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationRecord {
    pub label: String,
    pub law: SwitchingLaw,
    pub steps: Vec<SimStep>,
}

impl SimulationRecord {
    fn with_capacity(label: String, law: SwitchingLaw, capacity: usize) -> Self {
        Self {
            label,
            law,
            steps: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn errors(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.error).collect()
    }

    pub fn torques(&self) -> Vec<f64> {
        self.steps.iter().map(|s| s.torque).collect()
    }

    pub fn metrics(&self) -> RunMetrics {
        RunMetrics::from_record(self)
    }
}

/// Tracking and chattering statistics of one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunMetrics {
    pub samples: usize,
    pub rms_error: f64,
    pub max_abs_error: f64,
    pub final_error: f64,
    /// Sum of |u_i - u_{i-1}|
    pub torque_total_variation: f64,
    /// Number of strict torque sign reversals
    pub switch_count: usize,
}

impl RunMetrics {
    pub fn from_record(record: &SimulationRecord) -> Self {
        let errors = record.errors();
        let torques = record.torques();

        let max_abs_error = errors.iter().fold(0.0f64, |acc, e| acc.max(e.abs()));
        let final_error = errors.last().copied().unwrap_or(0.0);

        let mut torque_total_variation = 0.0;
        let mut switch_count = 0;
        for pair in torques.windows(2) {
            torque_total_variation += (pair[1] - pair[0]).abs();
            if sign(pair[0]) * sign(pair[1]) < 0.0 {
                switch_count += 1;
            }
        }

        Self {
            samples: record.len(),
            rms_error: rms_error(&errors),
            max_abs_error,
            final_error,
            torque_total_variation,
            switch_count,
        }
    }
}

/// Calculate RMS error, zero for an empty slice
pub fn rms_error(errors: &[f64]) -> f64 {
    if errors.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = errors.iter().map(|&e| e * e).sum();
    (sum_sq / errors.len() as f64).sqrt()
}

/// Seeded additive noise on the measured angle
#[derive(Debug, Clone)]
struct MeasurementNoise {
    rng: StdRng,
    dist: Normal<f64>,
}

impl MeasurementNoise {
    fn new(sigma: f64, seed: u64) -> Result<Option<Self>, SmcError> {
        if sigma == 0.0 {
            return Ok(None);
        }
        let dist = Normal::new(0.0, sigma)
            .map_err(|err| SmcError::InvalidConfig(format!("sigma_noise: {err}")))?;
        Ok(Some(Self {
            rng: StdRng::seed_from_u64(seed),
            dist,
        }))
    }

    fn sample(&mut self) -> f64 {
        self.dist.sample(&mut self.rng)
    }
}

/// State block owned by exactly one run
#[derive(Debug, Clone)]
struct RunSlot {
    controller: SlidingModeController,
    plant: SingleLinkArm,
    memory: ControllerMemory,
    noise: Option<MeasurementNoise>,
    record: SimulationRecord,
    non_finite_reported: bool,
}

impl RunSlot {
    fn advance(&mut self, t: f64, reference: ReferenceSample, source: VelocitySource) {
        let mut measured = self.plant.angle();
        if let Some(noise) = self.noise.as_mut() {
            measured += noise.sample();
        }

        let (memory, out) = match source {
            VelocitySource::FiniteDifference => {
                self.controller.control(self.memory, measured, reference.angle)
            }
            VelocitySource::Analytic => self.controller.control_with_desired_velocity(
                self.memory,
                measured,
                reference.angle,
                reference.velocity,
            ),
        };
        self.memory = memory;
        self.plant.update(out.torque);

        let state = self.plant.state();
        if !state.is_finite() && !self.non_finite_reported {
            warn!(
                run = %self.record.label,
                time = t,
                angle = state.angle,
                velocity = state.velocity,
                "arm state is no longer finite"
            );
            self.non_finite_reported = true;
        }

        let (tip_x, tip_y) = self.plant.position();
        self.record.steps.push(SimStep {
            time: t,
            desired_angle: reference.angle,
            desired_velocity: reference.velocity,
            angle: state.angle,
            velocity: state.velocity,
            error: state.angle - reference.angle,
            torque: out.torque,
            surface: out.surface,
            tip_x,
            tip_y,
        });
    }
}

/// Lockstep driver over a fixed time grid
#[derive(Debug, Clone)]
pub struct Simulation {
    config: SimConfig,
    reference: SineReference,
    steps: usize,
    cursor: usize,
    runs: Vec<RunSlot>,
}

impl Simulation {
    /// Create a driver with no runs
    pub fn new(config: SimConfig) -> Result<Self, SmcError> {
        config.validate()?;
        let reference = config.reference()?;
        let steps = config.steps();
        Ok(Self {
            config,
            reference,
            steps,
            cursor: 0,
            runs: Vec::new(),
        })
    }

    /// Create a driver with one run per law selected in `config`
    pub fn from_config(config: SimConfig) -> Result<Self, SmcError> {
        let laws = config.switching_laws()?;
        let mut sim = Self::new(config)?;
        for law in laws {
            sim.add_run(law)?;
        }
        Ok(sim)
    }

    /// Add a run named after its law
    pub fn add_run(&mut self, law: SwitchingLaw) -> Result<RunId, SmcError> {
        self.add_named_run(law.name(), law)
    }

    /// Add a run with fresh plant, controller memory and record
    ///
    /// Runs can only be added before the first step.
    pub fn add_named_run(
        &mut self,
        label: impl Into<String>,
        law: SwitchingLaw,
    ) -> Result<RunId, SmcError> {
        if self.cursor > 0 {
            return Err(SmcError::InvalidConfig(
                "runs cannot be added after the simulation has started".to_string(),
            ));
        }

        let label = label.into();
        if self.runs.iter().any(|slot| slot.record.label == label) {
            return Err(SmcError::InvalidConfig(format!(
                "duplicate run label {label:?}"
            )));
        }

        let controller = self.config.controller(law)?;
        let initial = ArmState::new(self.config.initial_angle, self.config.initial_velocity);
        let plant = SingleLinkArm::with_state(self.config.plant_params()?, initial);
        let noise = MeasurementNoise::new(self.config.sigma_noise, self.config.seed)?;

        let id = RunId(self.runs.len());
        debug!(run = %label, law = law.name(), id = id.0, "added run");
        self.runs.push(RunSlot {
            controller,
            plant,
            memory: ControllerMemory::default(),
            noise,
            record: SimulationRecord::with_capacity(label, law, self.steps),
            non_finite_reported: false,
        });
        Ok(id)
    }

    /// Advance every run by one grid point. Returns `false` once the grid
    /// is exhausted.
    pub fn step(&mut self) -> bool {
        if self.cursor >= self.steps {
            return false;
        }

        let t = self.cursor as f64 * self.config.dt;
        let sample = self.reference.sample(t);
        let source = self.config.velocity_source;
        for slot in self.runs.iter_mut() {
            slot.advance(t, sample, source);
        }

        self.cursor += 1;
        true
    }

    /// Run all remaining steps and return one record per run, in the
    /// order the runs were added
    pub fn run(mut self) -> Vec<SimulationRecord> {
        debug!(
            runs = self.runs.len(),
            steps = self.steps,
            dt = self.config.dt,
            "starting simulation"
        );
        while self.step() {}
        for slot in &self.runs {
            let metrics = slot.record.metrics();
            debug!(
                run = %slot.record.label,
                rms_error = metrics.rms_error,
                switch_count = metrics.switch_count,
                "run finished"
            );
        }
        self.into_records()
    }

    pub fn into_records(self) -> Vec<SimulationRecord> {
        self.runs.into_iter().map(|slot| slot.record).collect()
    }

    pub fn record(&self, id: RunId) -> Option<&SimulationRecord> {
        self.runs.get(id.0).map(|slot| &slot.record)
    }

    pub fn arm_state(&self, id: RunId) -> Option<ArmState> {
        self.runs.get(id.0).map(|slot| slot.plant.state())
    }

    pub fn controller_memory(&self, id: RunId) -> Option<ControllerMemory> {
        self.runs.get(id.0).map(|slot| slot.memory)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn total_steps(&self) -> usize {
        self.steps
    }

    pub fn steps_taken(&self) -> usize {
        self.cursor
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }
}

/// Run every law selected in `config` side by side
pub fn run_simulation(config: &SimConfig) -> Result<Vec<SimulationRecord>, SmcError> {
    Ok(Simulation::from_config(config.clone())?.run())
}

/// Run a single law
pub fn run_single(config: &SimConfig, law: SwitchingLaw) -> Result<SimulationRecord, SmcError> {
    let mut sim = Simulation::new(config.clone())?;
    let id = sim.add_run(law)?;
    sim.run()
        .into_iter()
        .nth(id.index())
        .ok_or_else(|| SmcError::InvalidConfig("run produced no record".to_string()))
}
