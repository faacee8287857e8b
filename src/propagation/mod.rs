//! Orbital propagation module
//!
//! Numerical integration of perturbed spacecraft motion around a hierarchy
//! of bodies.
//!
//! - `forces`: central gravity with J2, atmospheric drag, third-body pulls
//! - `atmosphere`: exponential density models used by drag
//! - `integrator`: embedded Runge-Kutta pairs with adaptive step control
//! - `propagator`: burns, SOI transitions and trajectory output
//! - `batch`: parallel propagation of many satellites
//!
//! # Example
//!
//! ```ignore
//! use orbit_planner::propagation::*;
//!
//! let system = BodySystem::solar_system()?;
//! let options = PropagationOptions::default();
//! let trajectory = propagate(&config, &system, Duration::from_seconds(5_400.0), &options)?;
//! ```

pub mod atmosphere;
pub mod batch;
pub mod cancel;
pub mod forces;
pub mod integrator;
pub mod propagator;
pub mod settings;
pub mod state;

pub use batch::propagate_many;
pub use cancel::CancellationToken;
pub use forces::{CompositeForce, ForceFlags, ForceModel};
pub use integrator::{AdaptiveDriver, DormandPrince54, Integrator, Rk4StepDoubling, StepControl};
pub use propagator::{propagate, ImpulsiveBurn, Propagator, SoiTransition, Trajectory};
pub use settings::{IntegratorKind, IntegratorSettings, PropagationOptions};
pub use state::{SatelliteConfig, SatelliteId, SpacecraftProperties, StateVector, TrajectorySample};
