//! Thread-safe get-or-add cache.
//!
//! Entries are never evicted: a cache lives exactly as long as the model or
//! context that owns it.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{PoisonError, RwLock};

/// Concurrent map with atomic insert-or-fetch semantics.
///
/// Once a value is stored for a key, every later `get_or_add` for that key
/// returns the same value, even when racing threads built their own.
#[derive(Debug)]
pub struct ConcurrentCache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for ConcurrentCache<K, V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<K: Eq + Hash, V: Clone> ConcurrentCache<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value for `key`, building it with `factory` on a miss.
    ///
    /// `factory` runs outside the lock; if another thread inserted first,
    /// its value wins and the freshly built one is dropped.
    pub fn get_or_add(&self, key: K, factory: impl FnOnce(&K) -> V) -> V {
        if let Some(existing) = self.try_get(&key) {
            return existing;
        }
        let candidate = factory(&key);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.entry(key).or_insert(candidate).clone()
    }

    pub fn try_get(&self, key: &K) -> Option<V> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
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
}
