//! Orbit Planner - perturbed orbit propagation and maneuver planning
//!
//! Propagates spacecraft around a hierarchy of gravitating bodies with J2,
//! drag and third-body perturbations, and plans impulsive burns on top of
//! those propagations.
//!
//! - [`propagation`]: force models, adaptive integrators and the propagator
//! - [`maneuver`]: ordered burn chains with incremental recompute
//! - [`transfer`]: Hohmann transfers with plane change
//! - [`apsis`]: next periapsis and apoapsis times
//!
//! Units are km, km/s and seconds throughout.

pub mod apsis;
pub mod astro;
pub mod bodies;
pub mod error;
pub mod maneuver;
pub mod propagation;
pub mod transfer;

pub use apsis::{next_apoapsis, next_periapsis};
pub use astro::{elements_to_state, state_to_elements, OrbitalElements};
pub use bodies::{BodyId, BodySystem, CelestialBody, Ephemeris};
pub use error::{OrbitError, Result};
pub use maneuver::{recompute_chain, ChainContext, ChainEvent, LocalDeltaV, ManeuverChain, NodeId};
pub use propagation::{
    propagate, propagate_many, CancellationToken, PropagationOptions, SatelliteConfig, StateVector, Trajectory,
};
pub use transfer::{compute_hohmann_transfer, HohmannResult, TargetOrbit};
