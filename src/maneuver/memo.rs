//! Memoized node predictions
//!
//! A prediction depends only on the checkpoint it starts from, the burn,
//! the spacecraft and the propagation options. Those inputs are hashed into
//! a key so repeated cascades (and previews of unchanged prefixes) skip the
//! propagation entirely.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use hifitime::Epoch;
use parking_lot::RwLock;

use super::{LocalDeltaV, PredictedOrbit};
use crate::propagation::settings::PropagationOptions;
use crate::propagation::state::{SpacecraftProperties, StateVector};

const DEFAULT_CAPACITY: usize = 1024;

/// Thread-safe prediction cache
pub struct RecomputeCache {
    entries: RwLock<HashMap<u64, PredictedOrbit>>,
    capacity: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl Default for RecomputeCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl RecomputeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache holding at most `capacity` predictions; a full cache is flushed
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: capacity.max(1),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, key: u64) -> Option<PredictedOrbit> {
        let found = self.entries.read().get(&key).cloned();
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    pub fn insert(&self, key: u64, prediction: PredictedOrbit) {
        let mut entries = self.entries.write();
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            log::debug!("Prediction cache full ({} entries), flushing", entries.len());
            entries.clear();
        }
        entries.insert(key, prediction);
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }

    /// Key for a prediction starting at `checkpoint`
    pub fn key(
        checkpoint: &StateVector,
        execution_time: Epoch,
        delta_v: &LocalDeltaV,
        properties: &SpacecraftProperties,
        options: &PropagationOptions,
    ) -> u64 {
        let mut h = DefaultHasher::new();

        checkpoint.central_body.hash(&mut h);
        hash_epoch(&mut h, checkpoint.epoch);
        for c in checkpoint.position.iter().chain(checkpoint.velocity.iter()) {
            hash_f64(&mut h, *c);
        }

        hash_epoch(&mut h, execution_time);
        hash_f64(&mut h, delta_v.prograde);
        hash_f64(&mut h, delta_v.normal);
        hash_f64(&mut h, delta_v.radial);

        hash_f64(&mut h, properties.mass_kg);
        hash_f64(&mut h, properties.drag_coefficient);
        hash_f64(&mut h, properties.area_m2);

        hash_options(&mut h, options);
        h.finish()
    }
}

fn hash_f64<H: Hasher>(h: &mut H, value: f64) {
    // -0.0 and 0.0 must collide
    let value = if value == 0.0 { 0.0 } else { value };
    value.to_bits().hash(h);
}

fn hash_epoch<H: Hasher>(h: &mut H, epoch: Epoch) {
    let (centuries, nanos) = epoch.to_tai_duration().to_parts();
    centuries.hash(h);
    nanos.hash(h);
}

fn hash_options<H: Hasher>(h: &mut H, options: &PropagationOptions) {
    options.forces.hash(h);
    hash_f64(h, options.drag_cutoff_km);
    hash_f64(h, options.entry_altitude_km);
    hash_f64(h, options.sample_interval);

    let integrator = &options.integrator;
    integrator.kind.hash(h);
    for value in [
        integrator.rel_tol,
        integrator.abs_tol,
        integrator.initial_step,
        integrator.min_step,
        integrator.max_step,
        integrator.safety,
        integrator.max_growth,
        integrator.grow_threshold,
    ] {
        hash_f64(h, value);
    }
    integrator.max_steps.hash(h);
}
