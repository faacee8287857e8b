//! Local orbital frame for impulsive burns
//!
//! Axes are built from the state at the burn:
//! - prograde = v̂
//! - radial = component of r perpendicular to prograde, normalised
//! - normal = prograde × radial

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::{OrbitError, Result};
use crate::propagation::state::StateVector;

/// Δv expressed in the local frame (km/s)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocalDeltaV {
    pub prograde: f64,
    pub normal: f64,
    pub radial: f64,
}

impl LocalDeltaV {
    pub fn new(prograde: f64, normal: f64, radial: f64) -> Self {
        Self {
            prograde,
            normal,
            radial,
        }
    }

    /// Build from components in m/s
    pub fn from_m_per_s(prograde: f64, normal: f64, radial: f64) -> Self {
        Self::new(prograde / 1_000.0, normal / 1_000.0, radial / 1_000.0)
    }

    pub fn prograde(dv: f64) -> Self {
        Self::new(dv, 0.0, 0.0)
    }

    pub fn magnitude(&self) -> f64 {
        self.as_vector().norm()
    }

    pub fn is_zero(&self) -> bool {
        self.prograde == 0.0 && self.normal == 0.0 && self.radial == 0.0
    }

    pub fn is_finite(&self) -> bool {
        self.prograde.is_finite() && self.normal.is_finite() && self.radial.is_finite()
    }

    /// (prograde, normal, radial)
    pub fn as_vector(&self) -> Vector3<f64> {
        Vector3::new(self.prograde, self.normal, self.radial)
    }

    /// Rotate into the state's inertial axes
    pub fn to_world(&self, state: &StateVector) -> Result<Vector3<f64>> {
        Ok(local_basis(state)? * self.as_vector())
    }

    /// Project an inertial Δv onto the state's local axes
    pub fn from_world(state: &StateVector, delta_v: &Vector3<f64>) -> Result<Self> {
        let local = local_basis(state)?.transpose() * delta_v;
        Ok(Self::new(local.x, local.y, local.z))
    }
}

/// Columns are the prograde, normal and radial unit vectors
fn local_basis(state: &StateVector) -> Result<Matrix3<f64>> {
    let speed = state.speed();
    if !(speed > 0.0) || !state.is_finite() {
        return Err(OrbitError::invalid(
            "local frame needs a finite, non-zero velocity",
        ));
    }
    let prograde = state.velocity / speed;

    let radial = state.position - prograde * state.position.dot(&prograde);
    let radial_norm = radial.norm();
    if radial_norm <= 1e-12 * state.radius().max(1.0) {
        return Err(OrbitError::invalid(
            "local frame undefined for purely radial motion",
        ));
    }
    let radial = radial / radial_norm;
    let normal = prograde.cross(&radial);

    Ok(Matrix3::from_columns(&[prograde, normal, radial]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::catalog;
    use approx::assert_relative_eq;
    use hifitime::Epoch;

    fn state(position: Vector3<f64>, velocity: Vector3<f64>) -> StateVector {
        StateVector::new(
            position,
            velocity,
            Epoch::from_gregorian_utc_hms(2025, 5, 11, 0, 0, 0),
            catalog::EARTH,
        )
    }

    #[test]
    fn test_circular_axes() {
        let s = state(Vector3::new(7_000.0, 0.0, 0.0), Vector3::new(0.0, 7.5, 0.0));

        let prograde = LocalDeltaV::new(1.0, 0.0, 0.0).to_world(&s).unwrap();
        let radial = LocalDeltaV::new(0.0, 0.0, 1.0).to_world(&s).unwrap();
        let normal = LocalDeltaV::new(0.0, 1.0, 0.0).to_world(&s).unwrap();

        assert_relative_eq!(prograde, Vector3::new(0.0, 1.0, 0.0), epsilon = 1e-15);
        assert_relative_eq!(radial, Vector3::new(1.0, 0.0, 0.0), epsilon = 1e-15);
        // prograde × radial = ŷ × x̂
        assert_relative_eq!(normal, Vector3::new(0.0, 0.0, -1.0), epsilon = 1e-15);
    }

    #[test]
    fn test_radial_is_perpendicular_on_eccentric_orbit() {
        let s = state(Vector3::new(7_000.0, 0.0, 0.0), Vector3::new(1.0, 8.0, 0.5));
        let radial = LocalDeltaV::new(0.0, 0.0, 1.0).to_world(&s).unwrap();
        assert!(radial.dot(&s.velocity).abs() < 1e-12);
        assert!(radial.dot(&s.position) > 0.0);
    }

    #[test]
    fn test_world_local_inverse() {
        let s = state(Vector3::new(5_000.0, 4_000.0, 1_000.0), Vector3::new(-4.0, 5.5, 2.0));
        let dv = LocalDeltaV::new(0.12, -0.03, 0.05);
        let world = dv.to_world(&s).unwrap();
        assert_relative_eq!(world.norm(), dv.magnitude(), max_relative = 1e-14);

        let back = LocalDeltaV::from_world(&s, &world).unwrap();
        assert_relative_eq!(back.as_vector(), dv.as_vector(), epsilon = 1e-15);
    }

    #[test]
    fn test_m_per_s_helper() {
        let dv = LocalDeltaV::from_m_per_s(100.0, 0.0, -20.0);
        assert_eq!(dv, LocalDeltaV::new(0.1, 0.0, -0.02));
    }

    #[test]
    fn test_degenerate_frames() {
        let radial_motion = state(Vector3::new(7_000.0, 0.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert!(LocalDeltaV::prograde(0.1).to_world(&radial_motion).is_err());

        let at_rest = state(Vector3::new(7_000.0, 0.0, 0.0), Vector3::zeros());
        assert!(LocalDeltaV::prograde(0.1).to_world(&at_rest).is_err());
    }
}
