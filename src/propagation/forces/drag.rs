//! Atmospheric drag force model
//!
//! Computes acceleration due to atmospheric drag using the formula:
//!
//! a = -½ ρ (Cd × A / m) |v_rel| v_rel
//!
//! where:
//! - ρ is atmospheric density from the central body's atmosphere model
//! - v_rel is velocity relative to the co-rotating atmosphere
//! - Cd × A is the drag coefficient times cross-sectional area
//! - m is spacecraft mass
//!
//! Density is in kg/m³ and area in m², so the result is scaled back to km/s².

use super::{ForceContext, ForceModel};
use crate::error::Result;
use crate::propagation::atmosphere::AtmosphereModel;
use nalgebra::Vector3;

/// Altitude above which drag is ignored (km)
pub const DEFAULT_DRAG_CUTOFF_KM: f64 = 500.0;

/// Atmospheric drag force model
pub struct AtmosphericDrag {
    /// Whether drag is currently enabled
    enabled: bool,

    /// Altitude above which drag is not evaluated (km)
    cutoff_altitude: f64,

    /// Replaces the central body's own atmosphere when set
    model_override: Option<Box<dyn AtmosphereModel>>,
}

impl Default for AtmosphericDrag {
    fn default() -> Self {
        Self::with_cutoff(DEFAULT_DRAG_CUTOFF_KM)
    }
}

impl AtmosphericDrag {
    /// Drag through each central body's own atmosphere
    pub fn with_cutoff(cutoff_altitude: f64) -> Self {
        Self {
            enabled: true,
            cutoff_altitude,
            model_override: None,
        }
    }

    /// Use `model` regardless of which body is central
    pub fn with_model(model: Box<dyn AtmosphereModel>, cutoff_altitude: f64) -> Self {
        log::debug!("Drag density override: {} ({})", model.name(), model.description());
        Self {
            enabled: true,
            cutoff_altitude,
            model_override: Some(model),
        }
    }

    /// Enable or disable drag
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn cutoff_altitude(&self) -> f64 {
        self.cutoff_altitude
    }

    /// Compute velocity relative to the rotating atmosphere
    ///
    /// The atmosphere co-rotates with the body about its pole, so the
    /// rotational velocity ω × r is subtracted.
    fn relative_velocity(ctx: &ForceContext<'_>) -> Vector3<f64> {
        let omega = ctx.central.pole.into_inner() * ctx.central.rotation_rate;
        ctx.velocity - omega.cross(&ctx.position)
    }

    fn density(&self, ctx: &ForceContext<'_>, altitude: f64) -> f64 {
        match (&self.model_override, &ctx.central.atmosphere) {
            (Some(model), _) => model.density(altitude),
            (None, Some(model)) => model.density(altitude),
            (None, None) => 0.0,
        }
    }
}

impl ForceModel for AtmosphericDrag {
    fn acceleration(&self, ctx: &ForceContext<'_>) -> Result<Vector3<f64>> {
        let altitude = ctx.altitude();

        // Skip if above the cutoff
        if altitude > self.cutoff_altitude {
            return Ok(Vector3::zeros());
        }

        let rho = self.density(ctx, altitude);
        if rho <= 0.0 {
            return Ok(Vector3::zeros());
        }

        let v_rel = Self::relative_velocity(ctx);
        let v_rel_mag = v_rel.norm();

        // Ballistic term: Cd × A / m (m²/kg)
        let cd_a_m = ctx.spacecraft.drag_area_to_mass();

        // ρ·(Cd A/m)·|v|·v with v in km/s gives 1e3 × km/s²
        Ok(-0.5 * rho * cd_a_m * v_rel_mag * v_rel * 1_000.0)
    }

    fn name(&self) -> &'static str {
        "Atmospheric Drag"
    }

    fn description(&self) -> &'static str {
        "Aerodynamic drag from atmospheric density"
    }

    fn enabled(&self) -> bool {
        self.enabled
    }
}
