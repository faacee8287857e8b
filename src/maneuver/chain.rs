//! Cascade-consistent maneuver chains
//!
//! Node `i` is always predicted from the post-burn state of node `i - 1`
//! (or from the satellite's current state for the first node). Edits never
//! touch the chain in place; they return a [`ChainUpdate`] carrying the
//! recomputed chain and the events that occurred, so the same procedure
//! serves previews (result discarded) and commits (result stored).

use hifitime::{Duration, Epoch};

use super::memo::RecomputeCache;
use super::{LocalDeltaV, ManeuverNode, NodeId, PredictedOrbit};
use crate::astro::{state_to_elements, OrbitalElements};
use crate::bodies::Ephemeris;
use crate::error::{OrbitError, Result};
use crate::propagation::cancel::CancellationToken;
use crate::propagation::propagator::{ImpulsiveBurn, Propagator};
use crate::propagation::settings::PropagationOptions;
use crate::propagation::state::{
    SatelliteConfig, SatelliteId, SpacecraftProperties, StateVector, TrajectorySample,
};

/// Post-burn coasts are cut off after this long (seconds)
const MAX_PREDICTION_SPAN_S: f64 = 172_800.0;

/// What a chain operation did, in order
#[derive(Debug, Clone, PartialEq)]
pub enum ChainEvent {
    NodeAdded { id: NodeId },
    NodeRemoved { id: NodeId },
    NodeEdited { id: NodeId },
    NodeRecomputed { id: NodeId },
    NodeFailed { id: NodeId, error: OrbitError },
}

/// New chain plus the events that produced it
#[derive(Debug, Clone)]
pub struct ChainUpdate {
    pub chain: ManeuverChain,
    pub events: Vec<ChainEvent>,
}

impl ChainUpdate {
    /// Nodes whose recompute failed
    pub fn failures(&self) -> impl Iterator<Item = (NodeId, &OrbitError)> {
        self.events.iter().filter_map(|e| match e {
            ChainEvent::NodeFailed { id, error } => Some((*id, error)),
            _ => None,
        })
    }
}

/// Ephemeral prediction for a burn that is not part of the chain
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewState {
    pub node: ManeuverNode,
    pub elements: OrbitalElements,
    pub post_burn_state: StateVector,
    pub trajectory: Vec<TrajectorySample>,
}

/// Inputs shared by every prediction in one recompute
#[derive(Clone, Copy)]
pub struct ChainContext<'a> {
    pub ephemeris: &'a dyn Ephemeris,
    pub options: &'a PropagationOptions,
    pub properties: SpacecraftProperties,
    pub cache: Option<&'a RecomputeCache>,
    pub cancel: Option<&'a CancellationToken>,
}

impl<'a> ChainContext<'a> {
    pub fn new(
        ephemeris: &'a dyn Ephemeris,
        options: &'a PropagationOptions,
        properties: SpacecraftProperties,
    ) -> Self {
        Self {
            ephemeris,
            options,
            properties,
            cache: None,
            cancel: None,
        }
    }

    pub fn with_cache(mut self, cache: &'a RecomputeCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_cancel(mut self, cancel: &'a CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }
}

/// Time-ordered burns of one satellite
#[derive(Debug, Clone, PartialEq)]
pub struct ManeuverChain {
    satellite_id: SatelliteId,
    nodes: Vec<ManeuverNode>,
    next_id: u64,
}

impl ManeuverChain {
    pub fn new(satellite_id: SatelliteId) -> Self {
        Self {
            satellite_id,
            nodes: Vec::new(),
            next_id: 1,
        }
    }

    pub fn satellite_id(&self) -> SatelliteId {
        self.satellite_id
    }

    /// Nodes sorted by execution time
    pub fn nodes(&self) -> &[ManeuverNode] {
        &self.nodes
    }

    pub fn get(&self, id: NodeId) -> Option<&ManeuverNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn has_stale(&self) -> bool {
        self.nodes.iter().any(|n| n.stale)
    }

    /// Burns for a full propagation of the committed plan
    pub fn burns(&self) -> Vec<ImpulsiveBurn> {
        self.nodes
            .iter()
            .map(|n| ImpulsiveBurn::new(n.execution_time, n.local_delta_v))
            .collect()
    }

    /// Insert a burn and recompute it and every later node
    pub fn add_node(
        &self,
        current_state: &StateVector,
        time: Epoch,
        delta_v: LocalDeltaV,
        ctx: &ChainContext<'_>,
    ) -> Result<ChainUpdate> {
        check_burn(current_state, time, &delta_v)?;

        let mut chain = self.clone();
        let id = chain.allocate_id();
        let index = chain.insert(ManeuverNode::new(id, self.satellite_id, time, delta_v));
        log::debug!("{}: added {} at {}", self.satellite_id, id, time);

        let mut events = vec![ChainEvent::NodeAdded { id }];
        recompute_from(&mut chain, index, current_state, ctx, &mut events);
        Ok(ChainUpdate { chain, events })
    }

    /// Delete a burn and recompute whatever followed it
    pub fn remove_node(
        &self,
        id: NodeId,
        current_state: &StateVector,
        ctx: &ChainContext<'_>,
    ) -> Result<ChainUpdate> {
        let index = self.position(id)?;

        let mut chain = self.clone();
        chain.nodes.remove(index);
        log::debug!("{}: removed {}", self.satellite_id, id);

        let mut events = vec![ChainEvent::NodeRemoved { id }];
        recompute_from(&mut chain, index, current_state, ctx, &mut events);
        Ok(ChainUpdate { chain, events })
    }

    /// Move and/or retarget a burn; same as remove followed by add
    pub fn edit_node(
        &self,
        id: NodeId,
        time: Epoch,
        delta_v: LocalDeltaV,
        current_state: &StateVector,
        ctx: &ChainContext<'_>,
    ) -> Result<ChainUpdate> {
        let old_index = self.position(id)?;
        check_burn(current_state, time, &delta_v)?;

        let mut chain = self.clone();
        let mut node = chain.nodes.remove(old_index);
        node.execution_time = time;
        node.local_delta_v = delta_v;
        let new_index = chain.insert(node);
        log::debug!("{}: edited {} to {}", self.satellite_id, id, time);

        let mut events = vec![ChainEvent::NodeEdited { id }];
        recompute_from(&mut chain, old_index.min(new_index), current_state, ctx, &mut events);
        Ok(ChainUpdate { chain, events })
    }

    /// Predict a burn as if it were committed, without changing the chain
    pub fn preview(
        &self,
        current_state: &StateVector,
        time: Epoch,
        delta_v: LocalDeltaV,
        ctx: &ChainContext<'_>,
    ) -> Result<PreviewState> {
        check_burn(current_state, time, &delta_v)?;

        let mut scratch = self.clone();
        scratch.nodes.retain(|n| n.execution_time <= time);
        let id = scratch.allocate_id();
        let index = scratch.insert(ManeuverNode::new(id, self.satellite_id, time, delta_v));

        let mut events = Vec::new();
        recompute_from(&mut scratch, index, current_state, ctx, &mut events);

        if let Some((_, error)) = events.iter().find_map(|e| match e {
            ChainEvent::NodeFailed { id, error } => Some((id, error)),
            _ => None,
        }) {
            return Err(error.clone());
        }

        let node = scratch.nodes.swap_remove(index);
        let predicted = node
            .predicted
            .clone()
            .ok_or_else(|| OrbitError::invalid("preview produced no prediction"))?;
        Ok(PreviewState {
            elements: predicted.elements,
            post_burn_state: predicted.post_burn_state,
            trajectory: predicted.trajectory,
            node,
        })
    }

    fn allocate_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Insert keeping time order; equal times keep insertion order
    fn insert(&mut self, node: ManeuverNode) -> usize {
        let index = self
            .nodes
            .partition_point(|n| n.execution_time <= node.execution_time);
        self.nodes.insert(index, node);
        index
    }

    fn position(&self, id: NodeId) -> Result<usize> {
        self.nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or(OrbitError::NodeNotFound(id))
    }
}

/// Recompute every node of `chain` from `current_state`
///
/// Pure: the input chain is left untouched.
pub fn recompute_chain(
    chain: &ManeuverChain,
    current_state: &StateVector,
    ctx: &ChainContext<'_>,
) -> ChainUpdate {
    let mut chain = chain.clone();
    let mut events = Vec::new();
    recompute_from(&mut chain, 0, current_state, ctx, &mut events);
    ChainUpdate { chain, events }
}

/// Recompute nodes `start..`, reusing the checkpoint of node `start - 1`
fn recompute_from(
    chain: &mut ManeuverChain,
    start: usize,
    current_state: &StateVector,
    ctx: &ChainContext<'_>,
    events: &mut Vec<ChainEvent>,
) {
    let (start, mut checkpoint) = match start.checked_sub(1).map(|i| &chain.nodes[i]) {
        Some(prev) => match prev.checkpoint() {
            Some(state) => (start, Some(state.clone())),
            None => (0, Some(current_state.clone())),
        },
        None => (0, Some(current_state.clone())),
    };

    for node in chain.nodes.iter_mut().skip(start) {
        let Some(from) = checkpoint.take() else {
            if !node.stale {
                log::warn!("{}: {} is stale, an earlier node failed", node.satellite_id, node.id);
            }
            node.stale = true;
            continue;
        };

        match predict(&from, node, ctx) {
            Ok(prediction) => {
                node.world_delta_v = Some(prediction.post_burn_state.velocity - prediction.pre_burn_state.velocity);
                checkpoint = Some(prediction.post_burn_state.clone());
                node.predicted = Some(prediction);
                node.stale = false;
                events.push(ChainEvent::NodeRecomputed { id: node.id });
            }
            Err(error) => {
                log::warn!("{}: recompute of {} failed: {}", node.satellite_id, node.id, error);
                node.stale = true;
                events.push(ChainEvent::NodeFailed { id: node.id, error });
            }
        }
    }
}

/// Coast from `checkpoint` to the node, burn, and sample the new orbit
fn predict(checkpoint: &StateVector, node: &ManeuverNode, ctx: &ChainContext<'_>) -> Result<PredictedOrbit> {
    if node.execution_time < checkpoint.epoch {
        return Err(OrbitError::invalid(format!(
            "{} executes at {} before its checkpoint at {}",
            node.id, node.execution_time, checkpoint.epoch
        )));
    }

    let key = RecomputeCache::key(
        checkpoint,
        node.execution_time,
        &node.local_delta_v,
        &ctx.properties,
        ctx.options,
    );
    if let Some(cached) = ctx.cache.and_then(|c| c.get(key)) {
        return Ok(cached);
    }

    let propagator = Propagator::new(ctx.ephemeris, ctx.options.clone())?;
    let config = SatelliteConfig::new(node.satellite_id, ctx.properties, checkpoint.clone());

    let coast = propagator.propagate_with_maneuvers(
        &config,
        node.execution_time - checkpoint.epoch,
        &[],
        ctx.cancel,
    )?;
    let pre_burn_state = coast.final_state;

    let mut post_burn_state = pre_burn_state.clone();
    post_burn_state.velocity += node.local_delta_v.to_world(&pre_burn_state)?;

    let body = ctx.ephemeris.require(post_burn_state.central_body)?;
    let elements = state_to_elements(&post_burn_state, body)?;

    let span = match post_burn_state.period(body.gm) {
        Some(period) => period.min(MAX_PREDICTION_SPAN_S),
        None => MAX_PREDICTION_SPAN_S,
    };
    let coast_after = propagator.propagate_to_surface(
        &config.with_initial(post_burn_state.clone()),
        Duration::from_seconds(span),
        ctx.cancel,
    )?;
    if let Some(epoch) = coast_after.surface_impact {
        log::debug!("{}: post-burn orbit impacts at {}", node.id, epoch);
    }
    let trajectory = coast_after.samples;

    let prediction = PredictedOrbit {
        elements,
        pre_burn_state,
        post_burn_state,
        trajectory,
    };
    if let Some(cache) = ctx.cache {
        cache.insert(key, prediction.clone());
    }
    Ok(prediction)
}

fn check_burn(current_state: &StateVector, time: Epoch, delta_v: &LocalDeltaV) -> Result<()> {
    if time < current_state.epoch {
        return Err(OrbitError::invalid(format!(
            "burn at {} is before the current state at {}",
            time, current_state.epoch
        )));
    }
    if !delta_v.is_finite() {
        return Err(OrbitError::invalid("burn delta-v is not finite"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::elements_to_state;
    use crate::bodies::{catalog, BodySystem, CelestialBody, EARTH_GM, EARTH_RADIUS_KM};

    fn current_state() -> StateVector {
        let earth = CelestialBody::earth();
        let elements = OrbitalElements::circular(
            EARTH_RADIUS_KM + 400.0,
            28.5_f64.to_radians(),
            0.0,
            0.0,
            EARTH_GM,
        );
        elements_to_state(&elements, &earth, catalog::default_epoch()).unwrap()
    }

    fn at(seconds: f64) -> Epoch {
        catalog::default_epoch() + Duration::from_seconds(seconds)
    }

    struct Fixture {
        system: BodySystem,
        options: PropagationOptions,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                system: BodySystem::earth_only(),
                options: PropagationOptions::two_body(),
            }
        }

        fn ctx(&self) -> ChainContext<'_> {
            ChainContext::new(&self.system, &self.options, SpacecraftProperties::default())
        }
    }

    fn predicted(chain: &ManeuverChain, id: NodeId) -> PredictedOrbit {
        chain.get(id).unwrap().predicted.clone().unwrap()
    }

    #[test]
    fn test_add_node_predicts_raised_orbit() {
        let fx = Fixture::new();
        let state = current_state();
        let chain = ManeuverChain::new(SatelliteId(1));

        let update = chain
            .add_node(&state, at(1_200.0), LocalDeltaV::from_m_per_s(50.0, 0.0, 0.0), &fx.ctx())
            .unwrap();
        let node = &update.chain.nodes()[0];
        assert_eq!(node.id, NodeId(1));
        assert!(!node.stale);

        let prediction = node.predicted.as_ref().unwrap();
        assert_eq!(prediction.pre_burn_state.epoch, at(1_200.0));
        assert!(prediction.elements.semi_major_axis > EARTH_RADIUS_KM + 400.0 + 50.0);
        assert!(prediction.trajectory.len() > 10);

        let world = node.world_delta_v.unwrap();
        assert!((world.norm() - 0.05).abs() < 1e-12);

        assert_eq!(
            update.events,
            vec![
                ChainEvent::NodeAdded { id: NodeId(1) },
                ChainEvent::NodeRecomputed { id: NodeId(1) },
            ]
        );
        // Input chain untouched
        assert!(chain.is_empty());
    }

    #[test]
    fn test_nodes_stay_time_sorted_with_monotonic_ids() {
        let fx = Fixture::new();
        let state = current_state();
        let chain = ManeuverChain::new(SatelliteId(1));
        let ctx = fx.ctx();

        let chain = chain.add_node(&state, at(3_000.0), LocalDeltaV::prograde(0.01), &ctx).unwrap().chain;
        let chain = chain.add_node(&state, at(1_000.0), LocalDeltaV::prograde(0.01), &ctx).unwrap().chain;
        let chain = chain.add_node(&state, at(2_000.0), LocalDeltaV::prograde(0.01), &ctx).unwrap().chain;

        let ids: Vec<_> = chain.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId(2), NodeId(3), NodeId(1)]);
        assert!(chain
            .nodes()
            .windows(2)
            .all(|w| w[0].execution_time <= w[1].execution_time));
    }

    #[test]
    fn test_add_then_remove_restores_predictions() {
        let fx = Fixture::new();
        let state = current_state();
        let ctx = fx.ctx();

        let base = ManeuverChain::new(SatelliteId(1))
            .add_node(&state, at(2_000.0), LocalDeltaV::prograde(0.02), &ctx)
            .unwrap()
            .chain;
        let original = predicted(&base, NodeId(1));

        let added = base
            .add_node(&state, at(800.0), LocalDeltaV::new(0.03, 0.01, 0.0), &ctx)
            .unwrap();
        assert_ne!(predicted(&added.chain, NodeId(1)), original);

        let removed = added.chain.remove_node(NodeId(2), &state, &ctx).unwrap();
        assert_eq!(removed.chain.len(), 1);
        let restored = predicted(&removed.chain, NodeId(1));
        assert_eq!(restored.elements, original.elements);
        assert_eq!(restored.post_burn_state, original.post_burn_state);
    }

    #[test]
    fn test_insert_before_changes_insert_after_does_not() {
        let fx = Fixture::new();
        let state = current_state();
        let ctx = fx.ctx();

        let base = ManeuverChain::new(SatelliteId(1))
            .add_node(&state, at(2_000.0), LocalDeltaV::prograde(0.02), &ctx)
            .unwrap()
            .chain;
        let original = predicted(&base, NodeId(1));

        let after = base
            .add_node(&state, at(4_000.0), LocalDeltaV::prograde(0.02), &ctx)
            .unwrap();
        assert_eq!(predicted(&after.chain, NodeId(1)), original);
        assert!(!after
            .events
            .contains(&ChainEvent::NodeRecomputed { id: NodeId(1) }));

        let before = base
            .add_node(&state, at(1_000.0), LocalDeltaV::prograde(0.02), &ctx)
            .unwrap();
        let changed = predicted(&before.chain, NodeId(1));
        assert_ne!(changed.elements, original.elements);
        assert!(changed.elements.semi_major_axis > original.elements.semi_major_axis);
    }

    #[test]
    fn test_edit_node_moves_and_recomputes() {
        let fx = Fixture::new();
        let state = current_state();
        let ctx = fx.ctx();

        let chain = ManeuverChain::new(SatelliteId(1))
            .add_node(&state, at(1_000.0), LocalDeltaV::prograde(0.02), &ctx)
            .unwrap()
            .chain
            .add_node(&state, at(2_000.0), LocalDeltaV::prograde(0.02), &ctx)
            .unwrap()
            .chain;

        let update = chain
            .edit_node(NodeId(1), at(3_000.0), LocalDeltaV::prograde(0.04), &state, &ctx)
            .unwrap();
        let ids: Vec<_> = update.chain.nodes().iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![NodeId(2), NodeId(1)]);
        assert_eq!(update.events[0], ChainEvent::NodeEdited { id: NodeId(1) });

        // Equivalent to building the same plan from scratch
        let fresh = ManeuverChain::new(SatelliteId(1))
            .add_node(&state, at(2_000.0), LocalDeltaV::prograde(0.02), &ctx)
            .unwrap()
            .chain
            .add_node(&state, at(3_000.0), LocalDeltaV::prograde(0.04), &ctx)
            .unwrap()
            .chain;
        for (a, b) in update.chain.nodes().iter().zip(fresh.nodes()) {
            assert_eq!(a.predicted, b.predicted);
        }

        assert!(matches!(
            chain.edit_node(NodeId(99), at(10.0), LocalDeltaV::default(), &state, &ctx),
            Err(OrbitError::NodeNotFound(NodeId(99)))
        ));
    }

    #[test]
    fn test_preview_matches_commit_without_mutating() {
        let fx = Fixture::new();
        let state = current_state();
        let ctx = fx.ctx();

        let chain = ManeuverChain::new(SatelliteId(1))
            .add_node(&state, at(1_000.0), LocalDeltaV::prograde(0.02), &ctx)
            .unwrap()
            .chain;
        let snapshot = chain.clone();

        let dv = LocalDeltaV::new(0.01, 0.005, -0.002);
        let preview = chain.preview(&state, at(2_500.0), dv, &ctx).unwrap();
        assert_eq!(chain, snapshot);

        let committed = chain.add_node(&state, at(2_500.0), dv, &ctx).unwrap().chain;
        let node = &committed.nodes()[1];
        let prediction = node.predicted.as_ref().unwrap();
        assert_eq!(prediction.elements, preview.elements);
        assert_eq!(prediction.post_burn_state, preview.post_burn_state);
        assert_eq!(preview.node.execution_time, at(2_500.0));
    }

    #[test]
    fn test_failure_keeps_last_prediction_and_marks_stale() {
        let fx = Fixture::new();
        let state = current_state();
        let ctx = fx.ctx();

        let chain = ManeuverChain::new(SatelliteId(1))
            .add_node(&state, at(500.0), LocalDeltaV::prograde(0.01), &ctx)
            .unwrap()
            .chain
            .add_node(&state, at(2_000.0), LocalDeltaV::prograde(0.01), &ctx)
            .unwrap()
            .chain
            .add_node(&state, at(2_500.0), LocalDeltaV::prograde(0.01), &ctx)
            .unwrap()
            .chain;
        let before_second = predicted(&chain, NodeId(2));
        let before_third = predicted(&chain, NodeId(3));

        // Deorbit burn: the coast to the second node hits the surface
        let update = chain
            .edit_node(NodeId(1), at(500.0), LocalDeltaV::prograde(-3.0), &state, &ctx)
            .unwrap();
        let nodes = update.chain.nodes();

        assert!(!nodes[0].stale);
        assert!(nodes[1].stale);
        assert!(nodes[2].stale);
        assert_eq!(nodes[1].predicted.as_ref(), Some(&before_second));
        assert_eq!(nodes[2].predicted.as_ref(), Some(&before_third));

        let failures: Vec<_> = update.failures().collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, NodeId(2));
        assert!(matches!(failures[0].1, OrbitError::SurfaceImpact { .. }));
        assert!(update.chain.has_stale());
    }

    #[test]
    fn test_deorbit_prediction_runs_to_the_surface() {
        let fx = Fixture::new();
        let state = current_state();
        let earth = fx.system.require(catalog::EARTH).unwrap();

        let chain = ManeuverChain::new(SatelliteId(1))
            .add_node(&state, at(500.0), LocalDeltaV::prograde(-3.0), &fx.ctx())
            .unwrap()
            .chain;
        let prediction = predicted(&chain, NodeId(1));
        let path = &prediction.trajectory;

        assert!(path.len() > 2, "{}", path.len());
        assert_eq!(path[0].epoch, at(500.0));
        assert_eq!(path[0].velocity, prediction.post_burn_state.velocity);
        assert!(path.windows(2).all(|w| w[0].epoch < w[1].epoch));

        let last = path.last().unwrap();
        assert!(earth.altitude(&last.position).abs() < 0.01);
        assert!(path.iter().all(|s| earth.altitude(&s.position) > -0.01));
    }

    #[test]
    fn test_cache_hits_return_identical_predictions() {
        let fx = Fixture::new();
        let state = current_state();
        let cache = RecomputeCache::new();
        let ctx = fx.ctx().with_cache(&cache);

        let chain = ManeuverChain::new(SatelliteId(1))
            .add_node(&state, at(1_000.0), LocalDeltaV::prograde(0.02), &ctx)
            .unwrap()
            .chain
            .add_node(&state, at(2_000.0), LocalDeltaV::prograde(0.01), &ctx)
            .unwrap()
            .chain;
        let hits_before = cache.hits();

        let update = recompute_chain(&chain, &state, &ctx);
        assert_eq!(cache.hits(), hits_before + 2);
        assert_eq!(update.chain, chain);

        let uncached = recompute_chain(&chain, &state, &fx.ctx());
        assert_eq!(uncached.chain, chain);
    }

    #[test]
    fn test_burn_in_the_past_rejected() {
        let fx = Fixture::new();
        let state = current_state();
        let chain = ManeuverChain::new(SatelliteId(1));
        let result = chain.add_node(&state, at(-10.0), LocalDeltaV::prograde(0.01), &fx.ctx());
        assert!(matches!(result, Err(OrbitError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_cancelled_recompute_flags_nodes() {
        let fx = Fixture::new();
        let state = current_state();
        let chain = ManeuverChain::new(SatelliteId(1))
            .add_node(&state, at(1_000.0), LocalDeltaV::prograde(0.02), &fx.ctx())
            .unwrap()
            .chain;

        let token = CancellationToken::new();
        token.cancel();
        let ctx = fx.ctx().with_cancel(&token);
        let update = recompute_chain(&chain, &state, &ctx);

        assert!(update.chain.nodes()[0].stale);
        assert_eq!(update.chain.nodes()[0].predicted, chain.nodes()[0].predicted);
        assert!(matches!(
            update.events[0],
            ChainEvent::NodeFailed { error: OrbitError::Cancelled, .. }
        ));
    }
}
