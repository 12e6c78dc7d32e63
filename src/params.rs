//! SMC arm parameters
//!
//! Physical parameters of the plant and gains of the sliding-mode law.
//! Both are validated once at construction and immutable afterwards.

use crate::SmcError;

/// Parameters of the single-link arm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantParams {
    /// Link length [m], used only by forward kinematics
    pub length: f64,
    /// Integration step [s]
    pub dt: f64,
}

impl PlantParams {
    /// Rotational inertia about the joint. Fixed at unity.
    pub const INERTIA: f64 = 1.0;
    /// Viscous damping coefficient. Fixed at unity.
    pub const DAMPING: f64 = 1.0;

    /// Create plant parameters, rejecting non-positive length or step
    pub fn new(length: f64, dt: f64) -> Result<Self, SmcError> {
        ensure_positive("dt", dt)?;
        ensure_positive("length", length)?;
        Ok(Self { length, dt })
    }
}

impl Default for PlantParams {
    fn default() -> Self {
        Self {
            length: 1.0,
            dt: 0.01,
        }
    }
}

/// Gains shared by both switching laws
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmcParams {
    /// Sliding surface slope
    pub lambda: f64,
    /// Switching gain
    pub k: f64,
    /// Controller sample period [s]
    pub dt: f64,
}

impl SmcParams {
    /// Create controller gains
    ///
    /// # Errors
    /// `lambda` and `dt` must be strictly positive, `k` non-negative.
    pub fn new(lambda: f64, k: f64, dt: f64) -> Result<Self, SmcError> {
        ensure_positive("lambda", lambda)?;
        ensure_positive("dt", dt)?;
        if !k.is_finite() || k < 0.0 {
            return Err(SmcError::InvalidConfig(format!(
                "k must be finite and >= 0, got {k}"
            )));
        }
        Ok(Self { lambda, k, dt })
    }
}

impl Default for SmcParams {
    fn default() -> Self {
        Self {
            lambda: 10.0,
            k: 5.0,
            dt: 0.01,
        }
    }
}

pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<(), SmcError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(SmcError::InvalidConfig(format!(
            "{name} must be finite and > 0, got {value}"
        )))
    }
}

pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<(), SmcError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SmcError::InvalidConfig(format!(
            "{name} must be finite, got {value}"
        )))
    }
}
