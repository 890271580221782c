//! Registry of tracked state entries.
//!
//! The registry records which entries are tracked and in what state; the
//! entries themselves stay owned by the unit of work that created them.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

use crate::state::EntityState;

static NEXT_ENTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one state entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(u64);

impl EntryId {
    pub(crate) fn next() -> Self {
        Self(NEXT_ENTRY_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the registry knows about one tracked entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedEntry {
    pub entity_type: String,
    pub state: EntityState,
}

/// Thread-safe set of tracked entries.
#[derive(Debug, Default)]
pub struct StateManager {
    entries: RwLock<HashMap<EntryId, TrackedEntry>>,
}

impl StateManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry to the tracked set, or update it if already present.
    pub fn start_tracking(&self, id: EntryId, entity_type: &str, state: EntityState) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(
            id,
            TrackedEntry {
                entity_type: entity_type.to_string(),
                state,
            },
        );
        tracing::debug!(entry = %id, entity_type, %state, tracked = entries.len(), "Started tracking");
    }

    /// Remove an entry from the tracked set. Returns whether it was tracked.
    pub fn stop_tracking(&self, id: EntryId) -> bool {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let removed = entries.remove(&id).is_some();
        if removed {
            tracing::debug!(entry = %id, tracked = entries.len(), "Stopped tracking");
        }
        removed
    }

    /// Record a new state for an already tracked entry.
    pub fn update_state(&self, id: EntryId, state: EntityState) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(&id) {
            entry.state = state;
        }
    }

    pub fn is_tracked(&self, id: EntryId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    pub fn state_of(&self, id: EntryId) -> Option<EntityState> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .map(|e| e.state)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the tracked set, ordered by entry id.
    pub fn tracked_entries(&self) -> Vec<(EntryId, TrackedEntry)> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut snapshot: Vec<_> = entries.iter().map(|(id, e)| (*id, e.clone())).collect();
        snapshot.sort_by_key(|(id, _)| *id);
        snapshot
    }

    /// Count tracked entries per state.
    pub fn count_in_state(&self, state: EntityState) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|e| e.state == state)
            .count()
    }
}
