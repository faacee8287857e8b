//! Accelerations acting on a spacecraft
//!
//! A [`CompositeForce`] sums [`ForceModel`] contributions evaluated in the
//! frame of the current central body. [`ForceFlags`] pick the standard set:
//!
//! - [`CentralGravity`]: point mass of the central body, plus J2 when enabled
//! - [`AtmosphericDrag`]: drag against the co-rotating atmosphere below a cutoff
//! - [`ThirdBody`]: differential pull of every other body in the ephemeris
//!
//! Positions inside the central body are reported as `SurfaceImpact`
//! before any model runs.

mod drag;
mod gravity;
mod third_body;

pub use drag::{AtmosphericDrag, DEFAULT_DRAG_CUTOFF_KM};
pub use gravity::{CentralGravity, GravityModel};
pub use third_body::ThirdBody;

use hifitime::Epoch;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::bodies::{CelestialBody, Ephemeris};
use crate::error::{OrbitError, Result};
use crate::propagation::state::SpacecraftProperties;

/// Everything a force model may look at
///
/// Position and velocity are relative to `central`, in the root frame axes.
#[derive(Clone, Copy)]
pub struct ForceContext<'a> {
    /// Position (km)
    pub position: Vector3<f64>,
    /// Velocity (km/s)
    pub velocity: Vector3<f64>,
    pub epoch: Epoch,
    pub central: &'a CelestialBody,
    pub ephemeris: &'a dyn Ephemeris,
    pub spacecraft: &'a SpacecraftProperties,
}

impl ForceContext<'_> {
    /// Altitude above the central body's equatorial radius (km)
    pub fn altitude(&self) -> f64 {
        self.central.altitude(&self.position)
    }
}

/// Trait for force model contributions
///
/// Each force model computes its acceleration contribution at a given
/// spacecraft state. Models should be thread-safe for parallel propagation.
pub trait ForceModel: Send + Sync {
    /// Acceleration contribution in km/s²
    fn acceleration(&self, ctx: &ForceContext<'_>) -> Result<Vector3<f64>>;

    /// Force model name for debugging and logging
    fn name(&self) -> &'static str;

    /// Brief description of the model
    fn description(&self) -> &'static str {
        self.name()
    }

    /// Whether this force model is currently enabled
    ///
    /// Disabled models are skipped during acceleration computation.
    fn enabled(&self) -> bool {
        true
    }
}

/// Perturbation switches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ForceFlags {
    pub include_j2: bool,
    pub include_drag: bool,
    pub include_third_body: bool,
}

impl Default for ForceFlags {
    fn default() -> Self {
        Self {
            include_j2: true,
            include_drag: true,
            include_third_body: true,
        }
    }
}

impl ForceFlags {
    /// Unperturbed two-body motion
    pub fn two_body() -> Self {
        Self {
            include_j2: false,
            include_drag: false,
            include_third_body: false,
        }
    }
}

/// Composite force model that aggregates multiple force contributions
///
/// This is the primary way to combine multiple force models into
/// a complete dynamics model.
pub struct CompositeForce {
    forces: Vec<Box<dyn ForceModel>>,
}

impl Default for CompositeForce {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositeForce {
    /// Create an empty composite force model
    pub fn new() -> Self {
        Self { forces: Vec::new() }
    }

    /// Standard model selected by perturbation flags
    pub fn from_flags(flags: ForceFlags, drag_cutoff_km: f64) -> Self {
        let mut forces = Self::new();
        forces.add(Box::new(if flags.include_j2 {
            CentralGravity::j2()
        } else {
            CentralGravity::point_mass()
        }));
        if flags.include_drag {
            forces.add(Box::new(AtmosphericDrag::with_cutoff(drag_cutoff_km)));
        }
        if flags.include_third_body {
            forces.add(Box::new(ThirdBody::all()));
        }
        forces
    }

    /// Add a force model to the composite
    pub fn add(&mut self, force: Box<dyn ForceModel>) {
        log::debug!("Adding force model: {} ({})", force.name(), force.description());
        self.forces.push(force);
    }

    /// Get the number of force models
    pub fn len(&self) -> usize {
        self.forces.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    /// List all force model names
    pub fn model_names(&self) -> Vec<&'static str> {
        self.forces.iter().map(|f| f.name()).collect()
    }

    /// Compute total acceleration from all enabled forces
    ///
    /// Fails with `SurfaceImpact` when the position is inside the central body.
    pub fn total_acceleration(&self, ctx: &ForceContext<'_>) -> Result<Vector3<f64>> {
        let altitude = ctx.altitude();
        if altitude < 0.0 {
            return Err(OrbitError::SurfaceImpact {
                body: ctx.central.id,
                epoch: ctx.epoch,
                altitude_km: altitude,
            });
        }

        self.unchecked_acceleration(ctx)
    }

    /// Total acceleration without the surface check
    ///
    /// Lets the propagator carry a state a few metres below the surface
    /// while it narrows down the impact time.
    pub fn unchecked_acceleration(&self, ctx: &ForceContext<'_>) -> Result<Vector3<f64>> {
        self.forces
            .iter()
            .filter(|f| f.enabled())
            .try_fold(Vector3::zeros(), |acc, f| Ok(acc + f.acceleration(ctx)?))
    }

    /// Compute acceleration with individual contributions for debugging
    pub fn acceleration_breakdown(
        &self,
        ctx: &ForceContext<'_>,
    ) -> Result<Vec<(&'static str, Vector3<f64>)>> {
        self.forces
            .iter()
            .filter(|f| f.enabled())
            .map(|f| Ok((f.name(), f.acceleration(ctx)?)))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use hifitime::Epoch;

    pub fn context<'a>(
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        central: &'a CelestialBody,
        ephemeris: &'a dyn Ephemeris,
        spacecraft: &'a SpacecraftProperties,
    ) -> ForceContext<'a> {
        ForceContext {
            position,
            velocity,
            epoch: Epoch::from_gregorian_utc_hms(2026, 1, 29, 12, 0, 0),
            central,
            ephemeris,
            spacecraft,
        }
    }
}
