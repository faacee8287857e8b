//! Configuration for numerical propagation

use serde::{Deserialize, Serialize};

use super::forces::{CompositeForce, ForceFlags, DEFAULT_DRAG_CUTOFF_KM};
use super::integrator::{DormandPrince54, Integrator, Rk4StepDoubling};
use crate::error::{OrbitError, Result};

/// Default altitude below which atmospheric entry is reported (km)
pub const DEFAULT_ENTRY_ALTITUDE_KM: f64 = 100.0;

/// Integrator selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IntegratorKind {
    /// Embedded Runge-Kutta 5(4)
    #[default]
    DormandPrince54,
    /// RK4 with step doubling
    Rk4StepDoubling,
}

impl IntegratorKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DormandPrince54 => "Dormand-Prince 5(4)",
            Self::Rk4StepDoubling => "RK4 (step doubling)",
        }
    }

    /// Fresh integrator instance; every propagation task builds its own
    pub fn create(&self) -> Box<dyn Integrator> {
        match self {
            Self::DormandPrince54 => Box::new(DormandPrince54),
            Self::Rk4StepDoubling => Box::new(Rk4StepDoubling),
        }
    }
}

/// Adaptive step control parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegratorSettings {
    pub kind: IntegratorKind,

    /// Relative error tolerance
    pub rel_tol: f64,

    /// Absolute error tolerance (km, km/s)
    pub abs_tol: f64,

    /// First trial step (seconds)
    pub initial_step: f64,

    /// Smallest step before giving up (seconds)
    pub min_step: f64,

    /// Largest step allowed (seconds)
    pub max_step: f64,

    /// Step attempts before giving up
    pub max_steps: usize,

    /// Safety factor applied to the optimal step estimate
    pub safety: f64,

    /// Maximum step growth per accepted step
    pub max_growth: f64,

    /// Steps only grow when the error norm is below this
    pub grow_threshold: f64,
}

impl Default for IntegratorSettings {
    fn default() -> Self {
        Self {
            kind: IntegratorKind::default(),
            rel_tol: 1e-10,
            abs_tol: 1e-9,
            initial_step: 60.0,
            min_step: 1e-6,
            max_step: 300.0,
            max_steps: 1_000_000,
            safety: 0.9,
            max_growth: 5.0,
            grow_threshold: 0.5,
        }
    }
}

impl IntegratorSettings {
    /// Quick propagation settings (lower accuracy, faster)
    pub fn fast() -> Self {
        Self {
            rel_tol: 1e-8,
            abs_tol: 1e-7,
            initial_step: 120.0,
            max_step: 600.0,
            max_steps: 100_000,
            ..Default::default()
        }
    }

    /// High-precision settings
    pub fn high_precision() -> Self {
        Self {
            rel_tol: 1e-12,
            abs_tol: 1e-11,
            initial_step: 30.0,
            max_step: 120.0,
            max_steps: 10_000_000,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("rel_tol", self.rel_tol),
            ("abs_tol", self.abs_tol),
            ("initial_step", self.initial_step),
            ("min_step", self.min_step),
            ("max_step", self.max_step),
            ("safety", self.safety),
            ("grow_threshold", self.grow_threshold),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(OrbitError::invalid(format!(
                    "{} must be positive and finite, got {}",
                    name, value
                )));
            }
        }
        if self.max_step < self.min_step {
            return Err(OrbitError::invalid(format!(
                "max_step {} is below min_step {}",
                self.max_step, self.min_step
            )));
        }
        if !(self.max_growth >= 1.0) {
            return Err(OrbitError::invalid("max_growth must be at least 1"));
        }
        if self.max_steps == 0 {
            return Err(OrbitError::invalid("max_steps must be non-zero"));
        }
        Ok(())
    }
}

/// Everything that shapes a propagation apart from the spacecraft itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropagationOptions {
    pub forces: ForceFlags,

    /// Drag is ignored above this altitude (km)
    pub drag_cutoff_km: f64,

    /// Altitude below which atmospheric entry is reported (km)
    pub entry_altitude_km: f64,

    /// Minimum spacing between stored samples (seconds, 0 = every step)
    pub sample_interval: f64,

    pub integrator: IntegratorSettings,
}

impl Default for PropagationOptions {
    fn default() -> Self {
        Self {
            forces: ForceFlags::default(),
            drag_cutoff_km: DEFAULT_DRAG_CUTOFF_KM,
            entry_altitude_km: DEFAULT_ENTRY_ALTITUDE_KM,
            sample_interval: 0.0,
            integrator: IntegratorSettings::default(),
        }
    }
}

impl PropagationOptions {
    /// Unperturbed two-body motion
    pub fn two_body() -> Self {
        Self {
            forces: ForceFlags::two_body(),
            ..Default::default()
        }
    }

    pub fn fast() -> Self {
        Self {
            integrator: IntegratorSettings::fast(),
            ..Default::default()
        }
    }

    pub fn high_precision() -> Self {
        Self {
            integrator: IntegratorSettings::high_precision(),
            ..Default::default()
        }
    }

    pub fn with_forces(mut self, forces: ForceFlags) -> Self {
        self.forces = forces;
        self
    }

    /// Thin stored samples to at most one per `interval` seconds
    pub fn with_sample_interval(mut self, interval: f64) -> Self {
        self.sample_interval = interval;
        self
    }

    pub fn build_forces(&self) -> CompositeForce {
        CompositeForce::from_flags(self.forces, self.drag_cutoff_km)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sample_interval.is_finite() && self.sample_interval >= 0.0) {
            return Err(OrbitError::invalid(format!(
                "sample_interval must be non-negative, got {}",
                self.sample_interval
            )));
        }
        if !self.drag_cutoff_km.is_finite() || !self.entry_altitude_km.is_finite() {
            return Err(OrbitError::invalid("altitude thresholds must be finite"));
        }
        self.integrator.validate()
    }
}
