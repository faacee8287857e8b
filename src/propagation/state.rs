//! Orbital and spacecraft state representations
//!
//! Provides the core state vectors used for numerical integration.
//! Positions are km and velocities km/s in an inertial frame centred on
//! `central_body`.

use std::fmt;

use hifitime::Epoch;
use nalgebra::{Vector3, Vector6};
use serde::{Deserialize, Serialize};

use crate::bodies::{BodyId, CelestialBody};
use crate::error::{OrbitError, Result};

/// Body-centred inertial state of a spacecraft
#[derive(Debug, Clone, PartialEq)]
pub struct StateVector {
    /// Position (km)
    pub position: Vector3<f64>,

    /// Velocity (km/s)
    pub velocity: Vector3<f64>,

    pub epoch: Epoch,

    /// Body the frame is centred on; changes across SOI transitions
    pub central_body: BodyId,
}

impl StateVector {
    pub fn new(
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        epoch: Epoch,
        central_body: BodyId,
    ) -> Self {
        Self {
            position,
            velocity,
            epoch,
            central_body,
        }
    }

    /// Pack position and velocity into a 6-vector for the integrator
    pub fn state6(&self) -> Vector6<f64> {
        Vector6::new(
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
        )
    }

    pub fn from_state6(y: &Vector6<f64>, epoch: Epoch, central_body: BodyId) -> Self {
        Self {
            position: y.fixed_rows::<3>(0).into_owned(),
            velocity: y.fixed_rows::<3>(3).into_owned(),
            epoch,
            central_body,
        }
    }

    /// Distance from the central body's centre (km)
    pub fn radius(&self) -> f64 {
        self.position.norm()
    }

    /// Height above `body`'s equatorial radius (km)
    pub fn altitude(&self, body: &CelestialBody) -> f64 {
        body.altitude(&self.position)
    }

    /// Speed (km/s)
    pub fn speed(&self) -> f64 {
        self.velocity.norm()
    }

    /// Specific orbital energy (km²/s²)
    pub fn specific_energy(&self, mu: f64) -> f64 {
        0.5 * self.velocity.norm_squared() - mu / self.radius()
    }

    /// Semi-major axis (km), negative for hyperbolic orbits
    pub fn semi_major_axis(&self, mu: f64) -> f64 {
        -mu / (2.0 * self.specific_energy(mu))
    }

    /// Orbital period in seconds (only valid for elliptical orbits)
    pub fn period(&self, mu: f64) -> Option<f64> {
        let a = self.semi_major_axis(mu);
        if a > 0.0 {
            Some(std::f64::consts::TAU * (a.powi(3) / mu).sqrt())
        } else {
            None
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position
            .iter()
            .chain(self.velocity.iter())
            .all(|c| c.is_finite())
    }

    /// Reject non-finite or zero position/velocity vectors
    pub fn validate(&self) -> Result<()> {
        if !self.is_finite() {
            return Err(OrbitError::invalid("state vector is not finite"));
        }
        if self.radius() <= 0.0 {
            return Err(OrbitError::invalid("zero position vector"));
        }
        if self.speed() <= 0.0 {
            return Err(OrbitError::invalid("zero velocity vector"));
        }
        Ok(())
    }
}

/// Physical properties used for drag
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacecraftProperties {
    /// Wet mass in kilograms
    pub mass_kg: f64,

    /// Drag coefficient Cd (typically 2.0-2.5)
    pub drag_coefficient: f64,

    /// Cross-sectional area in m²
    pub area_m2: f64,
}

impl Default for SpacecraftProperties {
    /// Typical small satellite: 100 kg, Cd = 2.2, 1 m²
    fn default() -> Self {
        Self {
            mass_kg: 100.0,
            drag_coefficient: 2.2,
            area_m2: 1.0,
        }
    }
}

impl SpacecraftProperties {
    pub fn new(mass_kg: f64, drag_coefficient: f64, area_m2: f64) -> Self {
        Self {
            mass_kg,
            drag_coefficient,
            area_m2,
        }
    }

    /// Cd·A/m in m²/kg
    pub fn drag_area_to_mass(&self) -> f64 {
        self.drag_coefficient * self.area_m2 / self.mass_kg
    }

    /// Ballistic coefficient m / (Cd·A) in kg/m²
    ///
    /// Lower values mean more drag, faster decay.
    pub fn ballistic_coefficient(&self) -> f64 {
        let cd_a = self.drag_coefficient * self.area_m2;
        if cd_a > 0.0 {
            self.mass_kg / cd_a
        } else {
            f64::INFINITY
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.mass_kg.is_finite() && self.mass_kg > 0.0) {
            return Err(OrbitError::invalid(format!(
                "spacecraft mass must be positive, got {}",
                self.mass_kg
            )));
        }
        if !(self.drag_coefficient >= 0.0 && self.area_m2 >= 0.0) {
            return Err(OrbitError::invalid("negative drag coefficient or area"));
        }
        Ok(())
    }
}

/// Satellite identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SatelliteId(pub u32);

impl fmt::Display for SatelliteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sat-{}", self.0)
    }
}

/// Everything the propagator needs to know about one satellite
#[derive(Debug, Clone)]
pub struct SatelliteConfig {
    pub id: SatelliteId,
    pub properties: SpacecraftProperties,
    pub initial: StateVector,
}

impl SatelliteConfig {
    pub fn new(id: SatelliteId, properties: SpacecraftProperties, initial: StateVector) -> Self {
        Self {
            id,
            properties,
            initial,
        }
    }

    /// Same satellite, different starting state
    pub fn with_initial(&self, initial: StateVector) -> Self {
        Self {
            id: self.id,
            properties: self.properties,
            initial,
        }
    }
}

/// One point of a propagated trajectory
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySample {
    pub epoch: Epoch,
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub central_body: BodyId,
}

impl From<&StateVector> for TrajectorySample {
    fn from(state: &StateVector) -> Self {
        Self {
            epoch: state.epoch,
            position: state.position,
            velocity: state.velocity,
            central_body: state.central_body,
        }
    }
}

impl From<&TrajectorySample> for StateVector {
    fn from(sample: &TrajectorySample) -> Self {
        Self {
            position: sample.position,
            velocity: sample.velocity,
            epoch: sample.epoch,
            central_body: sample.central_body,
        }
    }
}
