//! Identity cache
//!
//! Maps (record type, row id) to the live instance loaded or saved for that
//! row. Entries hold weak references only: once the caller drops every handle
//! the entry goes inert and the next lookup misses.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Weak;

use crate::model::{Instance, Model, RowId};

type Key = (TypeId, RowId);

/// Entry count below which `remember` never sweeps
const MIN_SWEEP_AT: usize = 64;

pub struct IdentityCache {
    entries: HashMap<Key, Weak<dyn Any + Send + Sync>>,
    /// `remember` purges inert entries once the map reaches this size
    sweep_at: usize,
}

impl Default for IdentityCache {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            sweep_at: MIN_SWEEP_AT,
        }
    }
}

impl IdentityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The live instance for `id`, if one is still referenced somewhere
    ///
    /// An inert entry is removed and reported as a miss.
    pub fn lookup<T: Model>(&mut self, id: RowId) -> Option<Instance<T>> {
        let key = (TypeId::of::<T>(), id);
        let strong = self.entries.get(&key)?.upgrade();
        match strong.and_then(Instance::<T>::from_any) {
            Some(instance) => Some(instance),
            None => {
                self.entries.remove(&key);
                None
            }
        }
    }

    /// Associate `id` with `instance`; the last writer wins
    ///
    /// Inert entries are swept whenever the map doubles past its size after
    /// the previous sweep, so the cache stays proportional to live instances.
    pub fn remember<T: Model>(&mut self, id: RowId, instance: &Instance<T>) {
        if self.entries.len() >= self.sweep_at {
            self.purge();
            self.sweep_at = (self.entries.len() * 2).max(MIN_SWEEP_AT);
        }
        self.entries
            .insert((TypeId::of::<T>(), id), instance.downgrade_any());
    }

    /// Drop the entry for `id`; returns whether one existed
    pub fn forget<T: Model>(&mut self, id: RowId) -> bool {
        self.forget_key(TypeId::of::<T>(), id)
    }

    pub fn forget_key(&mut self, type_id: TypeId, id: RowId) -> bool {
        self.entries.remove(&(type_id, id)).is_some()
    }

    /// Remove every inert entry, returning how many were dropped
    pub fn purge(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        before - self.entries.len()
    }

    /// Number of entries, live or inert
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.sweep_at = MIN_SWEEP_AT;
    }
}

impl std::fmt::Debug for IdentityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
