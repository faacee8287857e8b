//! Per-satellite chain storage
//!
//! Each satellite's chain sits behind its own mutex, so edits to one
//! satellite are serialised while other satellites proceed in parallel.
//! Readers only ever see committed chains.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::chain::{ChainEvent, ChainUpdate, ManeuverChain};
use crate::error::Result;
use crate::propagation::state::SatelliteId;

#[derive(Default)]
pub struct ChainRegistry {
    chains: RwLock<HashMap<SatelliteId, Arc<Mutex<ManeuverChain>>>>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, id: SatelliteId) -> Arc<Mutex<ManeuverChain>> {
        if let Some(chain) = self.chains.read().get(&id) {
            return Arc::clone(chain);
        }
        let mut chains = self.chains.write();
        Arc::clone(
            chains
                .entry(id)
                .or_insert_with(|| Arc::new(Mutex::new(ManeuverChain::new(id)))),
        )
    }

    /// Copy of the committed chain, empty for unknown satellites
    pub fn snapshot(&self, id: SatelliteId) -> ManeuverChain {
        self.entry(id).lock().clone()
    }

    /// Run one edit under the satellite's lock and commit the result
    ///
    /// The chain is only replaced when `edit` succeeds.
    pub fn apply<F>(&self, id: SatelliteId, edit: F) -> Result<Vec<ChainEvent>>
    where
        F: FnOnce(&ManeuverChain) -> Result<ChainUpdate>,
    {
        let entry = self.entry(id);
        let mut chain = entry.lock();
        let update = edit(&chain)?;
        if update.chain.has_stale() {
            log::warn!("{} committed with stale maneuver nodes", id);
        }
        *chain = update.chain;
        Ok(update.events)
    }

    pub fn satellites(&self) -> Vec<SatelliteId> {
        let mut ids: Vec<_> = self.chains.read().keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn remove(&self, id: SatelliteId) -> Option<ManeuverChain> {
        self.chains
            .write()
            .remove(&id)
            .map(|chain| chain.lock().clone())
    }
}
