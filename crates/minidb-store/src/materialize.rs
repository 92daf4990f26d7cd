//! Materializers: turning result rows into live instances
//!
//! Queries run eagerly; instances are built when the caller supplies the
//! constructor arguments. A row whose id already has a live instance in the
//! identity cache yields that instance untouched.

use std::fmt;
use std::marker::PhantomData;

use minidb_core::model::ID_COLUMN;
use minidb_core::{Column, Instance, MinidbError, Model, ResultRow, RowId, Rows, Select, Value};

use crate::errors::{internal, Result};
use crate::store::Store;

/// At most one pending instance, produced by [`Store::get`]
pub struct Materializer<'s, T: Model> {
    store: &'s Store,
    row: Option<ResultRow>,
    _model: PhantomData<fn() -> T>,
}

impl<'s, T: Model> Materializer<'s, T> {
    /// The matched row, if any
    pub fn row(&self) -> Option<&ResultRow> {
        self.row.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.row.is_none()
    }

    /// Build the instance, or `None` when nothing matched
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` or `UnknownField` when the row does not fit `T`.
    pub fn call(self, args: T::Args) -> Result<Option<Instance<T>>> {
        match self.row {
            Some(row) => self.store.hydrate::<T>(row, args).map(Some),
            None => Ok(None),
        }
    }
}

impl<T: Model> fmt::Debug for Materializer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Materializer")
            .field("type", &T::type_name())
            .field("row", &self.row)
            .finish_non_exhaustive()
    }
}

/// Pending instances for every row of a query, produced by [`Store::load`]
pub struct Loader<'s, T: Model> {
    store: &'s Store,
    rows: Rows,
    _model: PhantomData<fn() -> T>,
}

impl<'s, T: Model> Loader<'s, T> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.len() == 0
    }

    /// Lazily build one instance per row, each from a clone of `args`
    pub fn call(self, args: T::Args) -> Hydrate<'s, T>
    where
        T::Args: Clone,
    {
        Hydrate {
            store: self.store,
            rows: self.rows,
            args,
        }
    }
}

impl<T: Model> fmt::Debug for Loader<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Loader")
            .field("type", &T::type_name())
            .field("rows", &self.rows.len())
            .finish_non_exhaustive()
    }
}

/// Single-pass iterator over materialized instances
pub struct Hydrate<'s, T: Model> {
    store: &'s Store,
    rows: Rows,
    args: T::Args,
}

impl<T: Model> fmt::Debug for Hydrate<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hydrate")
            .field("type", &T::type_name())
            .field("remaining", &self.rows.len())
            .finish_non_exhaustive()
    }
}

impl<'s, T: Model> Iterator for Hydrate<'s, T>
where
    T::Args: Clone,
{
    type Item = Result<Instance<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        Some(self.store.hydrate::<T>(row, self.args.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl Store {
    /// Single instance whose columns equal every `(name, value)` pair
    ///
    /// No pairs match every row.
    ///
    /// # Errors
    ///
    /// - `UnknownField` for a name `T` does not declare
    /// - `AmbiguousResult` when more than one row matches
    /// - `UnknownClass`, `StoreClosed`, `Backend`
    pub fn get<T, I, K, V>(&self, filters: I) -> Result<Materializer<'_, T>>
    where
        T: Model,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        self.instrumented("get", Some(T::type_name()), || {
            let mut select = Select::<T>::records();
            for (name, value) in filters {
                select = select.filter(Column::<T>::new(name).eq(value));
            }
            let mut rows = select.query(self)?;
            if rows.len() > 1 {
                return Err(MinidbError::AmbiguousResult {
                    table: T::table_name(),
                    count: rows.len(),
                }
                .into());
            }
            Ok(Materializer {
                store: self,
                row: rows.next(),
                _model: PhantomData,
            })
        })
    }

    /// Every row of `T`
    ///
    /// # Errors
    ///
    /// `UnknownClass`, `StoreClosed`, `Backend`
    pub fn load<T: Model>(&self) -> Result<Loader<'_, T>> {
        self.load_where(Select::records())
    }

    /// Rows of `T` selected by `select`
    ///
    /// The selection must include `id`; columns it leaves out keep whatever
    /// the constructor set.
    ///
    /// # Errors
    ///
    /// - `UnknownField` for a name `T` does not declare
    /// - `UnknownClass`, `StoreClosed`, `Backend`
    pub fn load_where<T: Model>(&self, select: Select<T>) -> Result<Loader<'_, T>> {
        self.instrumented("load", Some(T::type_name()), || {
            let rows = select.query(self)?;
            Ok(Loader {
                store: self,
                rows,
                _model: PhantomData,
            })
        })
    }

    /// The live instance for `row`, constructing one on a cache miss
    ///
    /// Construction runs without the store lock; the cache is checked again
    /// afterwards so concurrent loads of one row end up sharing an instance.
    pub(crate) fn hydrate<T: Model>(&self, row: ResultRow, args: T::Args) -> Result<Instance<T>> {
        let id: RowId = row
            .id()
            .ok_or_else(|| internal("hydrate", "result row has no id column"))?;

        let cached = self.lock().cache.lookup::<T>(id);
        if let Some(instance) = cached {
            return Ok(instance);
        }

        let instance = Instance::<T>::construct(args);
        {
            let mut record = instance.write();
            for (name, value) in row.into_values() {
                if name != ID_COLUMN {
                    record.set_column(&name, value)?;
                }
            }
            record.set_id(Some(id));
        }

        let mut inner = self.lock();
        if let Some(existing) = inner.cache.lookup::<T>(id) {
            return Ok(existing);
        }
        inner.cache.remember(id, &instance);
        Ok(instance)
    }
}

/// Store operations spelled from the model side: `T::get(&store, ..)`
pub trait ModelStoreExt: Model {
    /// # Errors
    ///
    /// See [`Store::get`].
    fn get<I, K, V>(store: &Store, filters: I) -> Result<Materializer<'_, Self>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        store.get(filters)
    }

    /// # Errors
    ///
    /// See [`Store::load`].
    fn load(store: &Store) -> Result<Loader<'_, Self>> {
        store.load()
    }

    /// # Errors
    ///
    /// See [`Store::load_where`].
    fn load_where(store: &Store, select: Select<Self>) -> Result<Loader<'_, Self>> {
        store.load_where(select)
    }
}

impl<T: Model> ModelStoreExt for T {}

/// Store operations spelled from the instance side: `instance.save(&store)`
pub trait InstanceStoreExt {
    /// # Errors
    ///
    /// See [`Store::save`].
    fn save(&self, store: &Store) -> Result<RowId>;

    /// # Errors
    ///
    /// See [`Store::delete`].
    fn delete(&self, store: &Store) -> Result<bool>;
}

impl<T: Model> InstanceStoreExt for Instance<T> {
    fn save(&self, store: &Store) -> Result<RowId> {
        store.save(self)
    }

    fn delete(&self, store: &Store) -> Result<bool> {
        store.delete(self)
    }
}
