use std::any::Any;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::errors::{MinidbError, Result};
use crate::introspect::describe;

use super::declare::{Model, RowId};
use super::value::Value;

/// Shared handle on a live record
///
/// Cloning the handle shares the record; the identity cache only ever holds
/// weak references to it, so the record is dropped with its last handle.
pub struct Instance<T: Model> {
    inner: Arc<RwLock<T>>,
}

impl<T: Model> Instance<T> {
    /// Wrap an already-constructed record
    pub fn new(record: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(record)),
        }
    }

    /// Run the record's constructor and wrap the result
    pub fn construct(args: T::Args) -> Self {
        Self::new(T::construct(args))
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> Option<RowId> {
        self.read().id()
    }

    /// Reference identity: both handles point at the same record
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Assign persisted columns by name
    ///
    /// Every name and value is checked against the declared fields before
    /// anything is written, so a failed assignment leaves the record as it was.
    ///
    /// # Errors
    ///
    /// - `UnknownField` for a name that is not a persisted column
    /// - `TypeMismatch` for a value that does not fit its column
    /// - any introspection failure of `T`
    pub fn assign<I, K, V>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        let meta = describe::<T>()?;
        let mut checked = Vec::new();
        for (name, value) in values {
            let name = name.as_ref();
            let field = meta.field(name).ok_or_else(|| MinidbError::UnknownField {
                type_name: meta.type_name().to_string(),
                field: name.to_string(),
            })?;
            checked.push((field.name, value.into().coerce(field.name, field.kind)?));
        }

        let mut record = self.write();
        for (name, value) in checked {
            record.set_column(name, value)?;
        }
        Ok(())
    }

    /// Type-erased weak reference for the identity cache
    pub(crate) fn downgrade_any(&self) -> Weak<dyn Any + Send + Sync> {
        let weak: Weak<RwLock<T>> = Arc::downgrade(&self.inner);
        weak
    }

    /// Recover a handle from a type-erased strong reference
    pub(crate) fn from_any(any: Arc<dyn Any + Send + Sync>) -> Option<Self> {
        any.downcast::<RwLock<T>>().ok().map(|inner| Self { inner })
    }

    /// Weak handle, used to undo persistence effects on rollback
    pub fn downgrade(&self) -> WeakInstance<T> {
        WeakInstance {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl<T: Model> Clone for Instance<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Model + std::fmt::Debug> std::fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(&*self.read()).finish()
    }
}

/// Non-owning counterpart of [`Instance`]
pub struct WeakInstance<T: Model> {
    inner: Weak<RwLock<T>>,
}

impl<T: Model> WeakInstance<T> {
    pub fn upgrade(&self) -> Option<Instance<T>> {
        self.inner.upgrade().map(|inner| Instance { inner })
    }
}

impl<T: Model> Clone for WeakInstance<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}
