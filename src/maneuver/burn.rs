use nalgebra::Vector3;
use serde::Deserialize;

use crate::error::{SimError, SimResult};
use crate::math::geometry::unit_or_zero;

/// Which way the "phase" component of a burn points. In both cases it's
/// perpendicular to the velocity.
#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseReference {
    /// `v x h`, where `h` is the orbit's angular momentum: in the orbital
    /// plane, pointing away from the primary.
    #[default]
    OrbitNormal,
    /// `v x axis`, for a fixed world axis. Agrees with `OrbitNormal` on
    /// orbits whose normal is `axis`.
    WorldAxis([f64; 3]),
}

/// Knobs controlling when and how fast planned burns are executed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurnTuning {
    /// How close (radians) the body's anomaly must be to a node's target
    /// before the node starts burning.
    pub tolerance: f64,
    /// Fraction of the remaining magnitude applied each tick.
    pub fraction: f64,
    /// Remaining magnitudes at or below this are burned in one go.
    pub epsilon: f64,
    pub phase_reference: PhaseReference,
}

impl Default for BurnTuning {
    fn default() -> Self {
        BurnTuning {
            tolerance: 1.0_f64.to_radians(),
            fraction: 1.0 / 15.0,
            epsilon: 1e-6,
            phase_reference: PhaseReference::OrbitNormal,
        }
    }
}

impl BurnTuning {
    /// A fraction outside (0, 1] would either never finish a burn or
    /// overshoot it.
    pub fn validate(&self) -> SimResult<()> {
        if !(self.fraction > 0.0 && self.fraction <= 1.0) {
            return Err(SimError::InvalidBurnFraction(self.fraction));
        }
        for (name, value) in [("execution tolerance", self.tolerance), ("burn epsilon", self.epsilon)] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(SimError::InvalidTolerance { name, value });
            }
        }
        Ok(())
    }

    /// How much of `remaining` to burn this tick.
    pub fn increment(&self, remaining: f64) -> f64 {
        if remaining <= 0.0 {
            return 0.0;
        }
        let applied = remaining * self.fraction;
        if remaining - applied <= self.epsilon {
            remaining
        } else {
            applied
        }
    }
}

/// The velocity change for a burn of `prograde` along the velocity and
/// `phase` along the phase direction. `relative_position` is measured from
/// the primary.
pub fn delta_v(
    relative_position: &Vector3<f64>,
    velocity: &Vector3<f64>,
    prograde: f64,
    phase: f64,
    reference: PhaseReference,
) -> Vector3<f64> {
    let tangent = unit_or_zero(velocity);
    let normal = match reference {
        PhaseReference::OrbitNormal => velocity.cross(&relative_position.cross(velocity)),
        PhaseReference::WorldAxis(axis) => velocity.cross(&Vector3::from(axis)),
    };
    prograde * tangent + phase * unit_or_zero(&normal)
}
