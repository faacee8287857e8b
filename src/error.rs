//! Error taxonomy for the planning engine
//!
//! Every fallible operation in the library returns [`Result`]. Errors are
//! surfaced to the caller as-is; nothing in the core retries on its own.

use hifitime::Epoch;

use crate::bodies::BodyId;
use crate::maneuver::NodeId;

/// Errors produced by propagation, planning and element conversion
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OrbitError {
    /// Bad mass, GM, tolerance or a degenerate state vector
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Step-count ceiling hit or step size fell below the floor
    #[error("integration diverged after {steps} steps ({elapsed_s:.3} s elapsed): {reason}")]
    IntegrationDiverged {
        steps: usize,
        elapsed_s: f64,
        reason: String,
    },

    /// Trajectory intersected the surface of a body
    #[error("surface impact on {body} at {epoch} (altitude {altitude_km:.3} km)")]
    SurfaceImpact {
        body: BodyId,
        epoch: Epoch,
        altitude_km: f64,
    },

    /// Apoapsis requested on an open orbit
    #[error("orbit has no apoapsis (eccentricity {eccentricity:.6})")]
    NoApoapsis { eccentricity: f64 },

    /// Periapsis of an open orbit already passed
    #[error("orbit has no future periapsis (eccentricity {eccentricity:.6})")]
    NoPeriapsis { eccentricity: f64 },

    /// Degenerate transfer request
    #[error("unreachable target: {0}")]
    UnreachableTarget(String),

    /// Ephemeris has no body with this id
    #[error("unknown body {0}")]
    UnknownBody(BodyId),

    /// Maneuver chain has no node with this id
    #[error("maneuver node {0} not found")]
    NodeNotFound(NodeId),

    /// Cancellation token tripped between integration steps
    #[error("propagation cancelled")]
    Cancelled,
}

impl OrbitError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }
}

pub type Result<T> = std::result::Result<T, OrbitError>;
