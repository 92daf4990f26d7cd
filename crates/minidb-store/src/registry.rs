//! Schema registry
//!
//! Per-store record of which record types have a table. Registration runs the
//! DDL once per type; the registry only tracks the outcome.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use minidb_core::{MinidbError, RecordMeta};

#[derive(Debug, Default)]
pub struct SchemaRegistry {
    registered: HashMap<TypeId, Arc<RecordMeta>>,
    /// Table name to the type that owns it
    tables: HashMap<String, (TypeId, &'static str)>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, type_id: TypeId) -> Option<Arc<RecordMeta>> {
        self.registered.get(&type_id).cloned()
    }

    pub fn contains(&self, type_id: TypeId) -> bool {
        self.registered.contains_key(&type_id)
    }

    /// Check that `meta`'s table is free or already owned by the same type
    ///
    /// # Errors
    ///
    /// Returns `TableConflict` when another type maps to the table.
    pub fn check_table(&self, meta: &RecordMeta) -> Result<(), MinidbError> {
        match self.tables.get(meta.table()) {
            Some((owner, owner_name)) if *owner != meta.type_id() => {
                Err(MinidbError::TableConflict {
                    table: meta.table().to_string(),
                    existing: (*owner_name).to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn insert(&mut self, meta: Arc<RecordMeta>) {
        self.tables.insert(
            meta.table().to_string(),
            (meta.type_id(), meta.type_name()),
        );
        self.registered.insert(meta.type_id(), meta);
    }

    /// Forget `type_id`, releasing its table name
    pub fn remove(&mut self, type_id: TypeId) {
        if let Some(meta) = self.registered.remove(&type_id) {
            self.tables.remove(meta.table());
        }
    }

    pub fn clear(&mut self) {
        self.registered.clear();
        self.tables.clear();
    }
}
