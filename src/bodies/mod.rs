//! Gravitating bodies and their ephemerides
//!
//! A [`BodySystem`] is a read-only snapshot of a body hierarchy. Each body
//! either sits at its parent's position ([`BodyMotion::Fixed`]) or follows a
//! canonical Keplerian orbit around its parent. Positions and velocities
//! are reported in the inertial frame of the root body.
//!
//! Propagation calls only ever borrow the ephemeris, so a single
//! `Arc<BodySystem>` can be shared by any number of worker threads.

pub mod catalog;

use std::collections::HashMap;
use std::fmt;

use hifitime::Epoch;
use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};

use crate::astro::anomaly::mean_to_true;
use crate::astro::elements::{vectors_from_elements, OrbitalElements};
use crate::error::{OrbitError, Result};
use crate::propagation::atmosphere::Exponential;

/// Earth's gravitational parameter in km³/s²
pub const EARTH_GM: f64 = 398_600.4418;

/// Earth's equatorial radius in km
pub const EARTH_RADIUS_KM: f64 = 6_378.137;

/// Earth's second zonal harmonic
pub const EARTH_J2: f64 = 1.082_626_68e-3;

/// Earth's rotation rate in rad/s
pub const EARTH_ROTATION_RATE: f64 = 7.292_115_0e-5;

/// NAIF-style body identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub i32);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Orbit of a body around its parent, fixed at a reference epoch
#[derive(Debug, Clone)]
pub struct CanonicalOrbit {
    /// Semi-major axis (km)
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    /// Inclination (rad)
    pub inclination: f64,
    /// Right ascension of the ascending node (rad)
    pub raan: f64,
    /// Argument of periapsis (rad)
    pub argument_of_periapsis: f64,
    /// Mean anomaly at `epoch` (rad)
    pub mean_anomaly_at_epoch: f64,
    /// Reference epoch of the elements
    pub epoch: Epoch,
}

/// How a body moves relative to its parent
#[derive(Debug, Clone)]
pub enum BodyMotion {
    /// At rest on top of the parent (or at the origin for the root)
    Fixed,
    /// Two-body motion around the parent
    Keplerian(CanonicalOrbit),
}

/// A gravitating body
#[derive(Debug, Clone)]
pub struct CelestialBody {
    pub id: BodyId,
    pub name: String,

    /// Gravitational parameter (km³/s²)
    pub gm: f64,

    /// Equatorial radius (km)
    pub radius: f64,

    /// Second zonal harmonic (dimensionless)
    pub j2: f64,

    /// Sphere-of-influence radius (km); infinite for the root
    pub soi_radius: f64,

    pub parent: Option<BodyId>,

    /// Sidereal rotation rate (rad/s), used for atmosphere co-rotation
    pub rotation_rate: f64,

    /// Spin axis in the inertial frame
    pub pole: Unit<Vector3<f64>>,

    /// Atmosphere density model, if the body has one
    pub atmosphere: Option<Exponential>,

    pub motion: BodyMotion,
}

impl CelestialBody {
    /// Stand-alone Earth at the origin with its pole along +Z
    pub fn earth() -> Self {
        Self {
            id: catalog::EARTH,
            name: "Earth".to_string(),
            gm: EARTH_GM,
            radius: EARTH_RADIUS_KM,
            j2: EARTH_J2,
            soi_radius: f64::INFINITY,
            parent: None,
            rotation_rate: EARTH_ROTATION_RATE,
            pole: Vector3::z_axis(),
            atmosphere: Some(Exponential::standard()),
            motion: BodyMotion::Fixed,
        }
    }

    /// Altitude above the equatorial radius for a body-centred position
    pub fn altitude(&self, position: &Vector3<f64>) -> f64 {
        position.norm() - self.radius
    }

    /// Period of an orbit with the given semi-major axis (seconds)
    pub fn period(&self, semi_major_axis: f64) -> f64 {
        std::f64::consts::TAU * (semi_major_axis.powi(3) / self.gm).sqrt()
    }

    /// Speed of a circular orbit at radius `r`
    pub fn circular_speed(&self, r: f64) -> f64 {
        (self.gm / r).sqrt()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.gm.is_finite() && self.gm > 0.0) {
            return Err(OrbitError::invalid(format!(
                "{} has non-positive GM {}",
                self.name, self.gm
            )));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(OrbitError::invalid(format!(
                "{} has non-positive radius {}",
                self.name, self.radius
            )));
        }
        if self.soi_radius <= self.radius {
            return Err(OrbitError::invalid(format!(
                "{} sphere of influence ({} km) is inside its surface",
                self.name, self.soi_radius
            )));
        }
        if let BodyMotion::Keplerian(orbit) = &self.motion {
            if self.parent.is_none() {
                return Err(OrbitError::invalid(format!(
                    "{} has an orbit but no parent",
                    self.name
                )));
            }
            if !(orbit.eccentricity >= 0.0 && orbit.eccentricity < 1.0)
                || orbit.semi_major_axis <= 0.0
            {
                return Err(OrbitError::invalid(format!(
                    "{} canonical orbit must be elliptical",
                    self.name
                )));
            }
        }
        Ok(())
    }
}

/// Laplace sphere-of-influence radius a·(m/M)^(2/5)
pub fn laplace_soi(semi_major_axis: f64, gm_body: f64, gm_parent: f64) -> f64 {
    semi_major_axis * (gm_body / gm_parent).powf(0.4)
}

/// Read-only body ephemeris provider
///
/// Implementations must be immutable for the duration of a call so that
/// independent propagations can share them across threads.
pub trait Ephemeris: Send + Sync {
    /// All bodies in the system
    fn bodies(&self) -> &[CelestialBody];

    fn body(&self, id: BodyId) -> Option<&CelestialBody>;

    /// Position and velocity of a body in the root inertial frame
    fn state(&self, id: BodyId, epoch: Epoch) -> Result<(Vector3<f64>, Vector3<f64>)>;

    fn require(&self, id: BodyId) -> Result<&CelestialBody> {
        self.body(id).ok_or(OrbitError::UnknownBody(id))
    }

    /// State of `target` relative to `origin`
    fn relative_state(
        &self,
        target: BodyId,
        origin: BodyId,
        epoch: Epoch,
    ) -> Result<(Vector3<f64>, Vector3<f64>)> {
        if target == origin {
            return Ok((Vector3::zeros(), Vector3::zeros()));
        }
        let (rt, vt) = self.state(target, epoch)?;
        let (ro, vo) = self.state(origin, epoch)?;
        Ok((rt - ro, vt - vo))
    }

    /// Body that owns the smallest sphere of influence containing `position`
    ///
    /// `position` is in the root frame. Falls back to the body with the
    /// largest point-mass acceleration when no sphere contains it.
    fn dominant_body(&self, position: &Vector3<f64>, epoch: Epoch) -> Result<BodyId> {
        let mut best: Option<(f64, BodyId)> = None;
        let mut strongest: Option<(f64, BodyId)> = None;

        for body in self.bodies() {
            let (rb, _) = self.state(body.id, epoch)?;
            let d = (position - rb).norm();
            if d < body.soi_radius && best.map_or(true, |(soi, _)| body.soi_radius < soi) {
                best = Some((body.soi_radius, body.id));
            }
            let pull = body.gm / (d * d).max(f64::MIN_POSITIVE);
            if strongest.map_or(true, |(p, _)| pull > p) {
                strongest = Some((pull, body.id));
            }
        }

        best.or(strongest)
            .map(|(_, id)| id)
            .ok_or_else(|| OrbitError::invalid("empty body system"))
    }

    /// Bodies whose parent is `id`
    fn children(&self, id: BodyId) -> Vec<&CelestialBody> {
        self.bodies()
            .iter()
            .filter(|b| b.parent == Some(id))
            .collect()
    }
}

/// A validated hierarchy of bodies
#[derive(Debug, Clone)]
pub struct BodySystem {
    bodies: Vec<CelestialBody>,
    index: HashMap<BodyId, usize>,
}

impl BodySystem {
    /// Build a system, checking ids, parents and body parameters
    pub fn new(bodies: Vec<CelestialBody>) -> Result<Self> {
        let mut index = HashMap::with_capacity(bodies.len());
        for (i, body) in bodies.iter().enumerate() {
            body.validate()?;
            if index.insert(body.id, i).is_some() {
                return Err(OrbitError::invalid(format!("duplicate body id {}", body.id)));
            }
        }

        for body in &bodies {
            let mut depth = 0;
            let mut cursor = body.parent;
            while let Some(parent) = cursor {
                let Some(&idx) = index.get(&parent) else {
                    return Err(OrbitError::invalid(format!(
                        "{} references unknown parent {}",
                        body.name, parent
                    )));
                };
                depth += 1;
                if depth > bodies.len() {
                    return Err(OrbitError::invalid(format!(
                        "parent cycle through {}",
                        body.name
                    )));
                }
                cursor = bodies[idx].parent;
            }
        }

        log::debug!("Body system with {} bodies", bodies.len());
        Ok(Self { bodies, index })
    }

    /// Earth alone, centred at the origin
    pub fn earth_only() -> Self {
        let earth = CelestialBody::earth();
        let mut index = HashMap::new();
        index.insert(earth.id, 0);
        Self {
            bodies: vec![earth],
            index,
        }
    }

    /// The bundled solar-system catalog
    pub fn solar_system() -> Result<Self> {
        Self::new(catalog::solar_system())
    }

    fn local_state(&self, body: &CelestialBody, epoch: Epoch) -> Result<(Vector3<f64>, Vector3<f64>)> {
        match (&body.motion, body.parent) {
            (BodyMotion::Keplerian(orbit), Some(parent)) => {
                let parent_gm = self.require(parent)?.gm;
                let mu = parent_gm + body.gm;
                let n = (mu / orbit.semi_major_axis.powi(3)).sqrt();
                let dt = (epoch - orbit.epoch).to_seconds();
                let mean_anomaly = orbit.mean_anomaly_at_epoch + n * dt;
                let elements = OrbitalElements {
                    semi_major_axis: orbit.semi_major_axis,
                    eccentricity: orbit.eccentricity,
                    inclination: orbit.inclination,
                    raan: orbit.raan,
                    argument_of_periapsis: orbit.argument_of_periapsis,
                    true_anomaly: mean_to_true(mean_anomaly, orbit.eccentricity),
                    period: std::f64::consts::TAU / n,
                };
                vectors_from_elements(&elements, mu)
            }
            _ => Ok((Vector3::zeros(), Vector3::zeros())),
        }
    }
}

impl Ephemeris for BodySystem {
    fn bodies(&self) -> &[CelestialBody] {
        &self.bodies
    }

    fn body(&self, id: BodyId) -> Option<&CelestialBody> {
        self.index.get(&id).map(|&i| &self.bodies[i])
    }

    fn state(&self, id: BodyId, epoch: Epoch) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let mut position = Vector3::zeros();
        let mut velocity = Vector3::zeros();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let body = self.require(current)?;
            let (r, v) = self.local_state(body, epoch)?;
            position += r;
            velocity += v;
            cursor = body.parent;
        }
        Ok((position, velocity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bodies::catalog::{MOON, SUN};
    use approx::assert_relative_eq;

    fn epoch() -> Epoch {
        Epoch::from_gregorian_utc_hms(2025, 5, 11, 0, 0, 0)
    }

    #[test]
    fn test_earth_only_is_static() {
        let system = BodySystem::earth_only();
        let (r, v) = system.state(catalog::EARTH, epoch()).unwrap();
        assert_eq!(r, Vector3::zeros());
        assert_eq!(v, Vector3::zeros());
        assert!(system.body(MOON).is_none());
    }

    #[test]
    fn test_unknown_body() {
        let system = BodySystem::earth_only();
        assert!(matches!(
            system.state(BodyId(42), epoch()),
            Err(OrbitError::UnknownBody(BodyId(42)))
        ));
    }

    #[test]
    fn test_solar_system_builds() {
        let system = BodySystem::solar_system();
        assert!(system.is_ok(), "{:?}", system.err());
        let system = system.unwrap();
        assert!(system.require(catalog::PHOBOS).is_ok());
        assert!(system.require(catalog::STYX).is_ok());
    }

    #[test]
    fn test_moon_distance() {
        let system = BodySystem::solar_system().unwrap();
        let (r, v) = system.relative_state(MOON, catalog::EARTH, epoch()).unwrap();
        // Perigee ~363,000 km, apogee ~405,500 km
        assert!(r.norm() > 360_000.0 && r.norm() < 410_000.0, "{}", r.norm());
        assert!(v.norm() > 0.9 && v.norm() < 1.1, "{}", v.norm());
    }

    #[test]
    fn test_earth_heliocentric() {
        let system = BodySystem::solar_system().unwrap();
        let (r, _) = system.relative_state(catalog::EARTH, SUN, epoch()).unwrap();
        let au = 149_597_870.7;
        assert!((r.norm() / au - 1.0).abs() < 0.02);
    }

    #[test]
    fn test_laplace_soi_earth() {
        let soi = laplace_soi(149_598_023.0, EARTH_GM, 132_712_440_041.9);
        assert_relative_eq!(soi, 925_000.0, max_relative = 0.01);
    }

    #[test]
    fn test_dominant_body() {
        let system = BodySystem::solar_system().unwrap();
        let t = epoch();
        let (earth, _) = system.state(catalog::EARTH, t).unwrap();
        let (moon, _) = system.state(MOON, t).unwrap();

        let near_earth = earth + Vector3::new(7000.0, 0.0, 0.0);
        assert_eq!(system.dominant_body(&near_earth, t).unwrap(), catalog::EARTH);

        let near_moon = moon + Vector3::new(2000.0, 0.0, 0.0);
        assert_eq!(system.dominant_body(&near_moon, t).unwrap(), MOON);

        let far = earth + Vector3::new(5.0e6, 0.0, 0.0);
        assert_eq!(system.dominant_body(&far, t).unwrap(), SUN);
    }

    #[test]
    fn test_rejects_bad_gm() {
        let mut earth = CelestialBody::earth();
        earth.gm = 0.0;
        assert!(matches!(
            BodySystem::new(vec![earth]),
            Err(OrbitError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_rejects_missing_parent() {
        let mut earth = CelestialBody::earth();
        earth.parent = Some(SUN);
        assert!(BodySystem::new(vec![earth]).is_err());
    }
}
