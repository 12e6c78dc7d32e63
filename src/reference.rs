//! Sinusoidal reference trajectory

use std::f64::consts::PI;

use crate::params::ensure_finite;
use crate::SmcError;

/// Desired angle and its exact derivative at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceSample {
    pub angle: f64,
    pub velocity: f64,
}

/// `theta_d(t) = A * sin(2 pi f t)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineReference {
    /// Amplitude A [rad]
    pub amplitude: f64,
    /// Frequency f [Hz]
    pub frequency: f64,
}

impl SineReference {
    pub fn new(amplitude: f64, frequency: f64) -> Result<Self, SmcError> {
        ensure_finite("amplitude", amplitude)?;
        ensure_finite("frequency", frequency)?;
        Ok(Self {
            amplitude,
            frequency,
        })
    }

    pub fn desired_angle(&self, t: f64) -> f64 {
        self.amplitude * (2.0 * PI * self.frequency * t).sin()
    }

    pub fn desired_velocity(&self, t: f64) -> f64 {
        2.0 * PI * self.frequency * self.amplitude * (2.0 * PI * self.frequency * t).cos()
    }

    pub fn sample(&self, t: f64) -> ReferenceSample {
        ReferenceSample {
            angle: self.desired_angle(t),
            velocity: self.desired_velocity(t),
        }
    }
}

impl Default for SineReference {
    fn default() -> Self {
        Self {
            amplitude: 0.5,
            frequency: 0.2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero_with_peak_velocity() {
        let reference = SineReference::default();
        let s = reference.sample(0.0);
        assert_eq!(s.angle, 0.0);
        assert!((s.velocity - 2.0 * PI * 0.2 * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_quarter_period_peak() {
        let reference = SineReference::new(0.5, 0.2).unwrap();
        // Period is 5 s.
        let s = reference.sample(1.25);
        assert!((s.angle - 0.5).abs() < 1e-12);
        assert!(s.velocity.abs() < 1e-12);
    }

    #[test]
    fn test_velocity_matches_central_difference() {
        let reference = SineReference::new(0.7, 0.3).unwrap();
        let h = 1e-6;
        for &t in &[0.1, 0.9, 2.3] {
            let numeric =
                (reference.desired_angle(t + h) - reference.desired_angle(t - h)) / (2.0 * h);
            assert!((numeric - reference.desired_velocity(t)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_rejects_non_finite() {
        assert!(SineReference::new(f64::NAN, 0.2).is_err());
        assert!(SineReference::new(0.5, f64::INFINITY).is_err());
    }
}
