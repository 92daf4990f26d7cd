//! Undo journal for in-memory effects of a transaction
//!
//! The engine rolls back rows and tables; the journal rolls back what saves,
//! deletes and registrations did to instances, the identity cache and the
//! schema registry. Field values changed on an instance are not restored.

use std::any::TypeId;

use minidb_core::{IdentityCache, Instance, Model, RowId};

use crate::registry::SchemaRegistry;

type Undo = Box<dyn FnOnce(&mut IdentityCache) + Send>;

#[derive(Default)]
pub struct Journal {
    undo: Vec<Undo>,
    /// Types whose table was created inside the transaction
    registered: Vec<TypeId>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    /// An insert stamped `id` on `instance`
    pub fn inserted<T: Model>(&mut self, id: RowId, instance: &Instance<T>) {
        let weak = instance.downgrade();
        self.undo.push(Box::new(move |cache: &mut IdentityCache| {
            if let Some(instance) = weak.upgrade() {
                instance.write().set_id(None);
            }
            cache.forget::<T>(id);
        }));
    }

    /// A delete cleared `id` from `instance`
    pub fn deleted<T: Model>(&mut self, id: RowId, instance: &Instance<T>) {
        let weak = instance.downgrade();
        self.undo.push(Box::new(move |cache: &mut IdentityCache| {
            if let Some(instance) = weak.upgrade() {
                instance.write().set_id(Some(id));
                cache.remember(id, &instance);
            }
        }));
    }

    /// Registration created the table of `type_id`
    pub fn registered(&mut self, type_id: TypeId) {
        self.registered.push(type_id);
    }

    /// Undo every recorded effect, newest first; returns how many ran
    pub fn rollback(self, cache: &mut IdentityCache, registry: &mut SchemaRegistry) -> usize {
        let count = self.len();
        for undo in self.undo.into_iter().rev() {
            undo(cache);
        }
        for type_id in self.registered {
            registry.remove(type_id);
        }
        count
    }

    pub fn len(&self) -> usize {
        self.undo.len() + self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for Journal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Journal")
            .field("entries", &self.undo.len())
            .field("registered", &self.registered.len())
            .finish()
    }
}
