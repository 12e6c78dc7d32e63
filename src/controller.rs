//! Sliding-mode controller
//!
//! Tracks a desired angle by driving the surface `s = e_dot + lambda * e`
//! to zero. Two switching laws share the same surface:
//!
//! - `Sign`: `u = -k * sign(s)`, discontinuous, chatters near `s = 0`
//! - `Saturation`: `u = -k * clamp(s / epsilon, -1, 1)`, continuous inside
//!   a boundary layer of width `epsilon`
//!
//! The controller holds parameters only. Its memory is threaded through
//! [`SlidingModeController::control`] by value, so every caller owns the
//! memory of exactly one loop.

use serde::{Deserialize, Serialize};

use crate::params::{ensure_positive, SmcParams};
use crate::state::ControllerMemory;
use crate::SmcError;

/// Sign function with `sign(0) = 0`
///
/// Unlike `f64::signum`, both zeros map to zero. NaN is passed through.
pub fn sign(value: f64) -> f64 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else if value == 0.0 {
        0.0
    } else {
        value
    }
}

/// Switching law applied to the sliding surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SwitchingLaw {
    /// Bang-bang switching on the sign of the surface
    Sign,
    /// Linear inside the boundary layer, saturated outside
    Saturation { epsilon: f64 },
}

impl SwitchingLaw {
    /// Boundary-layer law, rejecting non-positive widths
    pub fn saturation(epsilon: f64) -> Result<Self, SmcError> {
        ensure_positive("epsilon", epsilon)?;
        Ok(Self::Saturation { epsilon })
    }

    /// Normalized switching term in `[-1, 1]`
    pub fn switching(&self, surface: f64) -> f64 {
        match *self {
            Self::Sign => sign(surface),
            Self::Saturation { epsilon } => (surface / epsilon).clamp(-1.0, 1.0),
        }
    }

    /// Short label used for run names and file names
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sign => "sign",
            Self::Saturation { .. } => "saturation",
        }
    }
}

/// Output of one control step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlOutput {
    /// Joint torque command
    pub torque: f64,
    /// Sliding surface value the torque was computed from
    pub surface: f64,
}

/// Sliding-mode tracking controller
#[derive(Debug, Clone, PartialEq)]
pub struct SlidingModeController {
    params: SmcParams,
    law: SwitchingLaw,
}

impl SlidingModeController {
    /// Create a controller, rejecting a saturation law with non-positive epsilon
    pub fn new(params: SmcParams, law: SwitchingLaw) -> Result<Self, SmcError> {
        if let SwitchingLaw::Saturation { epsilon } = law {
            ensure_positive("epsilon", epsilon)?;
        }
        Ok(Self { params, law })
    }

    /// Perform one control step
    ///
    /// Both the measured and the desired velocity are backward finite
    /// differences against `memory`. Must be called exactly once per step
    /// in increasing time order.
    ///
    /// # Returns
    /// The memory for the next call and the control output
    pub fn control(
        &self,
        memory: ControllerMemory,
        angle: f64,
        desired_angle: f64,
    ) -> (ControllerMemory, ControlOutput) {
        let desired_velocity = (desired_angle - memory.last_desired_angle) / self.params.dt;
        self.control_with_desired_velocity(memory, angle, desired_angle, desired_velocity)
    }

    /// Perform one control step with an externally supplied desired velocity
    ///
    /// The measured velocity is still a finite difference of `angle`.
    pub fn control_with_desired_velocity(
        &self,
        memory: ControllerMemory,
        angle: f64,
        desired_angle: f64,
        desired_velocity: f64,
    ) -> (ControllerMemory, ControlOutput) {
        let measured_velocity = (angle - memory.last_angle) / self.params.dt;

        let error = angle - desired_angle;
        let error_rate = measured_velocity - desired_velocity;
        let surface = error_rate + self.params.lambda * error;
        let torque = -self.params.k * self.law.switching(surface);

        let next = ControllerMemory::new(angle, desired_angle);
        (next, ControlOutput { torque, surface })
    }

    pub fn params(&self) -> &SmcParams {
        &self.params
    }

    pub fn law(&self) -> SwitchingLaw {
        self.law
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller(law: SwitchingLaw) -> SlidingModeController {
        SlidingModeController::new(SmcParams::new(10.0, 5.0, 0.01).unwrap(), law).unwrap()
    }

    #[test]
    fn test_sign_of_zero_is_zero() {
        assert_eq!(sign(0.0), 0.0);
        assert_eq!(sign(-0.0), 0.0);
        assert_eq!(sign(1e-300), 1.0);
        assert_eq!(sign(-1e-300), -1.0);
        assert!(sign(f64::NAN).is_nan());
    }

    #[test]
    fn test_saturation_rejects_non_positive_epsilon() {
        assert!(SwitchingLaw::saturation(0.1).is_ok());
        assert!(SwitchingLaw::saturation(0.0).is_err());
        assert!(SwitchingLaw::saturation(-0.1).is_err());

        let params = SmcParams::default();
        let bypass = SwitchingLaw::Saturation { epsilon: 0.0 };
        assert!(SlidingModeController::new(params, bypass).is_err());
    }

    #[test]
    fn test_saturation_is_linear_inside_layer() {
        let law = SwitchingLaw::saturation(0.5).unwrap();
        assert!((law.switching(0.25) - 0.5).abs() < 1e-15);
        assert_eq!(law.switching(2.0), 1.0);
        assert_eq!(law.switching(-2.0), -1.0);
    }

    #[test]
    fn test_zero_error_gives_zero_torque() {
        let smc = controller(SwitchingLaw::Sign);
        let (memory, out) = smc.control(ControllerMemory::default(), 0.0, 0.0);
        assert_eq!(out.surface, 0.0);
        assert_eq!(out.torque, 0.0);
        assert_eq!(memory, ControllerMemory::default());
    }

    #[test]
    fn test_first_call_uses_zero_memory() {
        let smc = controller(SwitchingLaw::Sign);
        let (_, out) = smc.control(ControllerMemory::default(), 0.0, 0.01);
        // e = -0.01, e_dot = 0 - 0.01 / 0.01 = -1
        assert!((out.surface - (-1.0 + 10.0 * -0.01)).abs() < 1e-12);
        assert_eq!(out.torque, 5.0);
    }

    #[test]
    fn test_memory_committed_after_output() {
        let smc = controller(SwitchingLaw::Sign);
        let memory = ControllerMemory::new(0.2, 0.1);
        let (next, out) = smc.control(memory, 0.3, 0.1);
        // e = 0.2, e_dot = (0.3 - 0.2) / 0.01 - 0 = 10
        assert!((out.surface - 12.0).abs() < 1e-9);
        assert_eq!(out.torque, -5.0);
        assert_eq!(next, ControllerMemory::new(0.3, 0.1));
    }

    #[test]
    fn test_laws_agree_outside_boundary_layer() {
        let sign = controller(SwitchingLaw::Sign);
        let sat = controller(SwitchingLaw::saturation(0.1).unwrap());
        let memory = ControllerMemory::new(0.0, 0.0);

        let (_, a) = sign.control(memory, 0.05, 0.0);
        let (_, b) = sat.control(memory, 0.05, 0.0);
        assert_eq!(a.surface, b.surface);
        assert_eq!(a.torque, b.torque);
    }

    #[test]
    fn test_supplied_desired_velocity_replaces_estimate() {
        let smc = controller(SwitchingLaw::saturation(1000.0).unwrap());
        let memory = ControllerMemory::default();
        let (_, estimated) = smc.control(memory, 0.0, 0.01);
        let (_, supplied) = smc.control_with_desired_velocity(memory, 0.0, 0.01, 0.0);
        assert!((estimated.surface - (-1.1)).abs() < 1e-12);
        assert!((supplied.surface - (-0.1)).abs() < 1e-12);
    }
}
