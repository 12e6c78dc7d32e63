//! Arm and controller state
//!
//! - `ArmState`: joint angle and angular velocity of the plant
//! - `ControllerMemory`: previous samples used for finite differences

/// Kinematic state of the arm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmState {
    /// Joint angle [rad], not wrapped
    pub angle: f64,
    /// Angular velocity [rad/s]
    pub velocity: f64,
}

impl ArmState {
    /// Create a new arm state
    pub fn new(angle: f64, velocity: f64) -> Self {
        Self { angle, velocity }
    }

    /// Arm at rest at zero angle
    pub fn zero() -> Self {
        Self {
            angle: 0.0,
            velocity: 0.0,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.angle.is_finite() && self.velocity.is_finite()
    }
}

impl Default for ArmState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Samples remembered by the controller between two calls
///
/// Starts at zero, so the first velocity estimates are `angle / dt` and
/// `desired_angle / dt`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ControllerMemory {
    /// Angle observed on the previous call
    pub last_angle: f64,
    /// Desired angle observed on the previous call
    pub last_desired_angle: f64,
}

impl ControllerMemory {
    pub fn new(last_angle: f64, last_desired_angle: f64) -> Self {
        Self {
            last_angle,
            last_desired_angle,
        }
    }
}
