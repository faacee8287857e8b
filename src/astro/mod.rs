//! Two-body orbital mechanics helpers
//!
//! Anomaly conversions and the state-vector ↔ classical-elements transform
//! used by the propagator, the maneuver chain and the apsis service.

pub mod anomaly;
pub mod elements;

pub use elements::{elements_to_state, state_to_elements, OrbitalElements};
