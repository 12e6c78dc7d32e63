//! Single-link arm plant
//!
//! Rigid link on a damped revolute joint, advanced with explicit Euler.

use crate::params::PlantParams;
use crate::state::ArmState;

/// Single-link arm driven by a joint torque
#[derive(Debug, Clone)]
pub struct SingleLinkArm {
    params: PlantParams,
    state: ArmState,
}

impl SingleLinkArm {
    /// Create an arm at rest at zero angle
    pub fn new(params: PlantParams) -> Self {
        Self::with_state(params, ArmState::zero())
    }

    /// Create an arm with a given initial state
    pub fn with_state(params: PlantParams, state: ArmState) -> Self {
        Self { params, state }
    }

    /// Apply `torque` for one step and return the angular acceleration
    ///
    /// Velocity is integrated first and the new velocity drives the angle
    /// update. The angle is never wrapped.
    pub fn update(&mut self, torque: f64) -> f64 {
        let dt = self.params.dt;
        let acceleration =
            (torque - PlantParams::DAMPING * self.state.velocity) / PlantParams::INERTIA;
        self.state.velocity += acceleration * dt;
        self.state.angle += self.state.velocity * dt;
        acceleration
    }

    /// Tip position `(x, y)` from forward kinematics
    pub fn position(&self) -> (f64, f64) {
        let length = self.params.length;
        (
            length * self.state.angle.cos(),
            length * self.state.angle.sin(),
        )
    }

    pub fn angle(&self) -> f64 {
        self.state.angle
    }

    pub fn velocity(&self) -> f64 {
        self.state.velocity
    }

    pub fn state(&self) -> ArmState {
        self.state
    }

    pub fn params(&self) -> &PlantParams {
        &self.params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arm() -> SingleLinkArm {
        SingleLinkArm::new(PlantParams::new(1.0, 0.01).unwrap())
    }

    #[test]
    fn test_zero_torque_at_rest_stays_put() {
        let mut arm = arm();
        for _ in 0..100 {
            assert_eq!(arm.update(0.0), 0.0);
        }
        assert_eq!(arm.state(), ArmState::zero());
    }

    #[test]
    fn test_velocity_updated_before_angle() {
        let mut arm = arm();
        let accel = arm.update(5.0);
        assert_eq!(accel, 5.0);
        assert!((arm.velocity() - 0.05).abs() < 1e-15);
        // Angle uses the freshly updated velocity.
        assert!((arm.angle() - 0.0005).abs() < 1e-15);

        let accel = arm.update(5.0);
        assert!((accel - 4.95).abs() < 1e-12);
        assert!((arm.angle() - 0.001495).abs() < 1e-15);
    }

    #[test]
    fn test_damping_decays_velocity() {
        let params = PlantParams::new(1.0, 0.01).unwrap();
        let mut arm = SingleLinkArm::with_state(params, ArmState::new(0.0, 1.0));
        let accel = arm.update(0.0);
        assert_eq!(accel, -1.0);
        assert!((arm.velocity() - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_angle_is_not_wrapped() {
        let params = PlantParams::new(1.0, 0.1).unwrap();
        let mut arm = SingleLinkArm::with_state(params, ArmState::new(0.0, 100.0));
        for _ in 0..10 {
            arm.update(100.0);
        }
        assert!(arm.angle() > std::f64::consts::TAU);
    }

    #[test]
    fn test_forward_kinematics() {
        let params = PlantParams::new(2.0, 0.01).unwrap();
        let arm = SingleLinkArm::with_state(
            params,
            ArmState::new(std::f64::consts::FRAC_PI_2, 0.0),
        );
        let (x, y) = arm.position();
        assert!(x.abs() < 1e-12);
        assert!((y - 2.0).abs() < 1e-12);
    }
}
