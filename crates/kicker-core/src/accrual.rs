//! Per-entity watch-time counters

use kicker_util::EntityId;
use std::collections::HashMap;

/// Result of crediting one observation to an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// No counter existed for the entity before this observation
    pub first_seen: bool,
    pub outcome: AccrualOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccrualOutcome {
    /// Counter was below the maximum and has been incremented
    Accrued { total: u64 },
    /// Counter had already reached the maximum; it was left unchanged
    OverQuota { total: u64 },
}

/// Seconds of restricted playback per entity since the last reset
///
/// An entity without a counter is unseen this period. Counters only grow
/// until [`AccrualStore::clear`] drops all of them at once.
#[derive(Debug, Default)]
pub struct AccrualStore {
    counters: HashMap<EntityId, u64>,
}

impl AccrualStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit one qualifying observation.
    ///
    /// Creates the counter at zero if the entity is unseen. A counter at or
    /// above `max_secs` is reported as over quota and not incremented;
    /// otherwise `delta_secs` is added.
    pub fn observe(&mut self, entity_id: &EntityId, max_secs: u64, delta_secs: u64) -> Observation {
        let first_seen = !self.counters.contains_key(entity_id);
        let counter = self.counters.entry(entity_id.clone()).or_insert(0);

        let outcome = if *counter >= max_secs {
            AccrualOutcome::OverQuota { total: *counter }
        } else {
            *counter = counter.saturating_add(delta_secs);
            AccrualOutcome::Accrued { total: *counter }
        };

        Observation { first_seen, outcome }
    }

    pub fn get(&self, entity_id: &EntityId) -> Option<u64> {
        self.counters.get(entity_id).copied()
    }

    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.counters.contains_key(entity_id)
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    /// Drop every counter, returning how many there were
    pub fn clear(&mut self) -> usize {
        let cleared = self.counters.len();
        self.counters.clear();
        cleared
    }
}
