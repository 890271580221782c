//! Entity lifecycle states.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle state of a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EntityState {
    /// Detached: not tracked by the state manager.
    #[default]
    Unknown,
    /// New entity, inserted on save.
    Added,
    /// Tracked with no pending changes.
    Unchanged,
    /// Tracked with at least one modified property, updated on save.
    Modified,
    /// Tracked entity, deleted on save.
    Deleted,
}

impl EntityState {
    /// Check whether an entry in this state belongs in the tracked set.
    pub const fn is_tracked(self) -> bool {
        !matches!(self, EntityState::Unknown)
    }

    /// Check whether saving an entry in this state issues a command.
    pub const fn needs_save(self) -> bool {
        matches!(
            self,
            EntityState::Added | EntityState::Modified | EntityState::Deleted
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            EntityState::Unknown => "Unknown",
            EntityState::Added => "Added",
            EntityState::Unchanged => "Unchanged",
            EntityState::Modified => "Modified",
            EntityState::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for EntityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
