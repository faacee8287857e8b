//! Maneuver planning
//!
//! A satellite's committed burns form a [`ManeuverChain`]. Every edit
//! returns a new chain in which each node's prediction was computed from
//! the nodes before it, plus the list of [`ChainEvent`]s that happened.

mod chain;
mod frame;
mod memo;
mod registry;

pub use chain::{recompute_chain, ChainContext, ChainEvent, ChainUpdate, ManeuverChain, PreviewState};
pub use frame::LocalDeltaV;
pub use memo::RecomputeCache;
pub use registry::ChainRegistry;

use std::fmt;

use hifitime::Epoch;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::astro::OrbitalElements;
use crate::propagation::state::{SatelliteId, StateVector, TrajectorySample};

/// Maneuver node identifier, unique within a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Predicted outcome of one burn
#[derive(Debug, Clone, PartialEq)]
pub struct PredictedOrbit {
    /// Elements of the post-burn orbit
    pub elements: OrbitalElements,
    pub pre_burn_state: StateVector,
    pub post_burn_state: StateVector,

    /// Post-burn coast over at most one revolution
    pub trajectory: Vec<TrajectorySample>,
}

/// One committed impulsive burn
#[derive(Debug, Clone, PartialEq)]
pub struct ManeuverNode {
    pub id: NodeId,
    pub satellite_id: SatelliteId,
    pub execution_time: Epoch,
    pub local_delta_v: LocalDeltaV,

    /// Inertial Δv from the last successful recompute (km/s)
    pub world_delta_v: Option<Vector3<f64>>,

    pub predicted: Option<PredictedOrbit>,

    /// Set when the last recompute could not refresh `predicted`
    pub stale: bool,
}

impl ManeuverNode {
    pub fn new(
        id: NodeId,
        satellite_id: SatelliteId,
        execution_time: Epoch,
        local_delta_v: LocalDeltaV,
    ) -> Self {
        Self {
            id,
            satellite_id,
            execution_time,
            local_delta_v,
            world_delta_v: None,
            predicted: None,
            stale: false,
        }
    }

    /// Post-burn state, if a trustworthy prediction exists
    pub fn checkpoint(&self) -> Option<&StateVector> {
        if self.stale {
            return None;
        }
        self.predicted.as_ref().map(|p| &p.post_burn_state)
    }
}
