//! Central body gravity force model
//!
//! Provides two fidelity levels:
//! - Point mass (μ/r²)
//! - Point mass + J2 oblateness about the body's spin axis

use super::{ForceContext, ForceModel};
use crate::error::Result;
use nalgebra::Vector3;

/// Gravity model fidelity selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GravityModel {
    /// Simple point mass: a = -μ/r³ × r
    PointMass,

    /// Point mass + J2 oblateness perturbation
    J2,
}

/// Gravity of whichever body the state is centred on
pub struct CentralGravity {
    model: GravityModel,
}

impl CentralGravity {
    pub fn new(model: GravityModel) -> Self {
        Self { model }
    }

    /// Create a point mass gravity model
    pub fn point_mass() -> Self {
        Self::new(GravityModel::PointMass)
    }

    /// Create a J2 gravity model
    ///
    /// J2 accounts for the body's oblateness (equatorial bulge).
    pub fn j2() -> Self {
        Self::new(GravityModel::J2)
    }

    pub fn model(&self) -> GravityModel {
        self.model
    }

    /// Point mass acceleration: a = -μ/r³ × r
    fn point_mass_accel(mu: f64, position: &Vector3<f64>) -> Vector3<f64> {
        let r = position.norm();
        let r3 = r * r * r;
        -mu / r3 * position
    }

    /// J2 perturbation acceleration
    ///
    /// Standard Cartesian J2 formula with z measured along the spin axis:
    /// a = (3/2)·J2·μ·R²/r⁵ · [(5z²/r² − 1)·r − 2z·p̂]
    fn j2_accel(ctx: &ForceContext<'_>) -> Vector3<f64> {
        let body = ctx.central;
        if body.j2 == 0.0 {
            return Vector3::zeros();
        }

        let position = &ctx.position;
        let pole = body.pole.into_inner();
        let r2 = position.norm_squared();
        let r = r2.sqrt();
        let r5 = r2 * r2 * r;
        let z = position.dot(&pole);

        // Common factor: (3/2) × J2 × μ × Re² / r⁵
        let factor = 1.5 * body.j2 * body.gm * body.radius * body.radius / r5;

        factor * ((5.0 * z * z / r2 - 1.0) * position - 2.0 * z * pole)
    }
}

impl ForceModel for CentralGravity {
    fn acceleration(&self, ctx: &ForceContext<'_>) -> Result<Vector3<f64>> {
        let point_mass = Self::point_mass_accel(ctx.central.gm, &ctx.position);
        Ok(match self.model {
            GravityModel::PointMass => point_mass,
            GravityModel::J2 => point_mass + Self::j2_accel(ctx),
        })
    }

    fn name(&self) -> &'static str {
        match self.model {
            GravityModel::PointMass => "Central Gravity (Point Mass)",
            GravityModel::J2 => "Central Gravity (J2)",
        }
    }

    fn description(&self) -> &'static str {
        match self.model {
            GravityModel::PointMass => "Central body gravity μ/r²",
            GravityModel::J2 => "Central gravity with J2 oblateness",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::{BodySystem, CelestialBody, Ephemeris, EARTH_GM, EARTH_J2, EARTH_RADIUS_KM};
    use crate::propagation::forces::test_support::context;
    use crate::propagation::state::SpacecraftProperties;
    use nalgebra::Unit;

    #[test]
    fn test_point_mass() {
        let system = BodySystem::earth_only();
        let earth = &system.bodies()[0];
        let props = SpacecraftProperties::default();
        let r = EARTH_RADIUS_KM + 400.0;
        let ctx = context(
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(0.0, 7.66, 0.0),
            earth,
            &system,
            &props,
        );

        let accel = CentralGravity::point_mass().acceleration(&ctx).unwrap();
        assert!(accel.x < 0.0);

        let expected = EARTH_GM / (r * r);
        assert!((accel.norm() - expected).abs() / expected < 1e-12);
    }

    #[test]
    fn test_j2_matches_component_formula() {
        let system = BodySystem::earth_only();
        let earth = &system.bodies()[0];
        let props = SpacecraftProperties::default();
        let position = Vector3::new(4_000.0, 3_000.0, 5_000.0);
        let ctx = context(position, Vector3::new(0.0, 7.0, 0.0), earth, &system, &props);

        let total = CentralGravity::j2().acceleration(&ctx).unwrap();
        let pm = CentralGravity::point_mass().acceleration(&ctx).unwrap();
        let j2 = total - pm;

        let (x, y, z) = (position.x, position.y, position.z);
        let r = position.norm();
        let f = 1.5 * EARTH_J2 * EARTH_GM * EARTH_RADIUS_KM.powi(2) / r.powi(5);
        let z2 = z * z / (r * r);
        let expected = Vector3::new(
            f * x * (5.0 * z2 - 1.0),
            f * y * (5.0 * z2 - 1.0),
            f * z * (5.0 * z2 - 3.0),
        );
        assert!((j2 - expected).norm() < 1e-15);
        // J2 pulls toward the equator for a northern position
        assert!(j2.z < 0.0);
    }

    #[test]
    fn test_j2_follows_pole() {
        // Tilting the pole onto +X must rotate the perturbation with it
        let mut tilted = CelestialBody::earth();
        tilted.pole = Unit::new_normalize(Vector3::new(1.0, 0.0, 0.0));
        let upright = CelestialBody::earth();
        let system = BodySystem::earth_only();
        let props = SpacecraftProperties::default();

        let a = CentralGravity::j2()
            .acceleration(&context(
                Vector3::new(0.0, 3_000.0, 6_000.0),
                Vector3::zeros(),
                &upright,
                &system,
                &props,
            ))
            .unwrap();
        let b = CentralGravity::j2()
            .acceleration(&context(
                Vector3::new(6_000.0, 3_000.0, 0.0),
                Vector3::zeros(),
                &tilted,
                &system,
                &props,
            ))
            .unwrap();

        assert!((a.z - b.x).abs() < 1e-14);
        assert!((a.y - b.y).abs() < 1e-14);
    }

    #[test]
    fn test_zero_j2_body() {
        let mut sphere = CelestialBody::earth();
        sphere.j2 = 0.0;
        let system = BodySystem::earth_only();
        let props = SpacecraftProperties::default();
        let ctx = context(
            Vector3::new(5_000.0, 1_000.0, 4_000.0),
            Vector3::zeros(),
            &sphere,
            &system,
            &props,
        );
        let a = CentralGravity::j2().acceleration(&ctx).unwrap();
        let b = CentralGravity::point_mass().acceleration(&ctx).unwrap();
        assert_eq!(a, b);
    }
}
