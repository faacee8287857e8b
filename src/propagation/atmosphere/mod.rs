//! Atmospheric density models for drag calculations
//!
//! Models are looked up per body: each [`CelestialBody`](crate::bodies::CelestialBody)
//! may carry one, and drag is only evaluated for bodies that do.
//!
//! # Implemented Models
//!
//! - **Exponential**: piecewise exponential decay (Earth standard table or
//!   single scale height)

mod exponential;

pub use exponential::{Exponential, ExponentialLayer};

/// Trait for atmospheric density models
///
/// Implementations must be thread-safe (Send + Sync) to allow
/// parallel propagation of multiple satellites.
pub trait AtmosphereModel: Send + Sync {
    /// Mass density in kg/m³ at `altitude` km above the equatorial radius
    fn density(&self, altitude: f64) -> f64;

    /// Model name for logging and display
    fn name(&self) -> &'static str;

    /// Brief description of the model
    fn description(&self) -> &'static str {
        "Atmospheric density model"
    }
}
