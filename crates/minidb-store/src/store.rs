//! Store / session
//!
//! A `Store` owns one connection together with its schema registry, identity
//! cache and transaction journal, all behind a single mutex.
//!
//! ## Logging Ownership
//!
//! Public store operations own lifecycle logging:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Statements are echoed through [`crate::db::echo`]; everything else below
//! the store uses `tracing::debug!()` only.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use minidb_core::introspect::describe_type;
use minidb_core::model::ID_COLUMN;
use minidb_core::query::{sql, CompiledQuery, OutputColumn};
use minidb_core::{
    log_op_end, log_op_error, log_op_start, FieldKind, IdentityCache, Instance, MinidbError,
    Model, Predicate, QueryExecutor, RecordMeta, RecordType, ResultRow, RowId, Rows, Select, Value,
};
use minidb_core_types::StoreId;
use rusqlite::Connection;

use crate::config::StoreConfig;
use crate::db;
use crate::errors::{from_rusqlite, internal, store_closed, transaction_active, Result};
use crate::journal::Journal;
use crate::registry::SchemaRegistry;

/// Everything guarded by the store mutex
pub(crate) struct StoreInner {
    conn: Option<Connection>,
    debug: bool,
    store_id: StoreId,
    pub(crate) registry: SchemaRegistry,
    pub(crate) cache: IdentityCache,
    pub(crate) journal: Option<Journal>,
}

impl StoreInner {
    fn new(conn: Connection, debug: bool, store_id: StoreId) -> Self {
        Self {
            conn: Some(conn),
            debug,
            store_id,
            registry: SchemaRegistry::new(),
            cache: IdentityCache::new(),
            journal: None,
        }
    }

    pub(crate) fn conn(&self, op: &str) -> Result<&Connection> {
        self.conn.as_ref().ok_or_else(|| store_closed(op))
    }

    pub(crate) fn execute(&self, op: &str, sql: &str, params: &[Value]) -> Result<usize> {
        let conn = self.conn(op)?;
        db::echo(self.debug, &self.store_id, sql, params);
        db::execute(conn, sql, params)
    }

    pub(crate) fn exists(&self, op: &str, sql: &str, params: &[Value]) -> Result<bool> {
        let conn = self.conn(op)?;
        db::echo(self.debug, &self.store_id, sql, params);
        db::exists(conn, sql, params)
    }

    pub(crate) fn fetch(
        &self,
        op: &str,
        sql: &str,
        params: &[Value],
        columns: &[OutputColumn],
    ) -> Result<Vec<ResultRow>> {
        let conn = self.conn(op)?;
        db::echo(self.debug, &self.store_id, sql, params);
        db::fetch(conn, sql, params, columns)
    }

    /// Create the table for `record_type` unless this store already did
    pub(crate) fn register(&mut self, record_type: &RecordType) -> Result<Arc<RecordMeta>> {
        if let Some(meta) = self.registry.get(record_type.type_id()) {
            return Ok(meta);
        }
        let meta = describe_type(record_type)?;
        self.registry.check_table(&meta)?;
        self.execute("register", &sql::create_table(&meta), &[])?;
        self.registry.insert(Arc::clone(&meta));
        if let Some(journal) = self.journal.as_mut() {
            journal.registered(meta.type_id());
        }

        tracing::debug!(
            table = meta.table(),
            store_id = self.store_id.as_str(),
            "registered record type {}",
            meta.type_name()
        );
        Ok(meta)
    }

    /// Registered metadata for `record_type`, registering it when allowed
    pub(crate) fn ensure_registered(
        &mut self,
        op: &str,
        record_type: &RecordType,
        autoregister: bool,
    ) -> Result<Arc<RecordMeta>> {
        self.conn(op)?;
        if let Some(meta) = self.registry.get(record_type.type_id()) {
            return Ok(meta);
        }
        if !autoregister {
            return Err(MinidbError::UnknownClass {
                type_name: record_type.type_name().to_string(),
            }
            .into());
        }
        self.register(record_type)
    }

    fn rollback(&mut self, journal: Journal) {
        if let Err(err) = self.execute("rollback", "ROLLBACK", &[]) {
            tracing::warn!(error = %err, store_id = self.store_id.as_str(), "rollback failed");
        }
        let undone = journal.rollback(&mut self.cache, &mut self.registry);
        tracing::debug!(undone, store_id = self.store_id.as_str(), "transaction rolled back");
    }
}

/// Session over one SQLite database
///
/// `Store` is `Send + Sync`; share it behind an `Arc` to use it from several
/// threads. Operations serialize on the store mutex.
pub struct Store {
    id: StoreId,
    config: StoreConfig,
    inner: Mutex<StoreInner>,
}

impl Store {
    /// Open the database described by `config`
    ///
    /// # Errors
    ///
    /// Returns `Backend` when the engine cannot open or configure the database.
    pub fn open(config: StoreConfig) -> Result<Self> {
        log_op_start!("open", path = ?config.path);
        let start = Instant::now();

        let conn = db::open(&config).map_err(|e| {
            log_op_error!(
                "open",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;
        let id = StoreId::new();

        log_op_end!(
            "open",
            duration_ms = start.elapsed().as_millis() as u64,
            store_id = id.as_str()
        );

        Ok(Self {
            inner: Mutex::new(StoreInner::new(conn, config.debug, id.clone())),
            id,
            config,
        })
    }

    /// Private in-memory database with default settings
    ///
    /// # Errors
    ///
    /// See [`Store::open`].
    pub fn in_memory() -> Result<Self> {
        Self::open(StoreConfig::in_memory())
    }

    /// Open a store, run `f` against it and close it again
    ///
    /// The store is closed whether `f` succeeds or fails; an error from `f`
    /// takes precedence over one from closing.
    ///
    /// # Errors
    ///
    /// Whatever opening, `f` or closing reports.
    pub fn scoped<R, F>(config: StoreConfig, f: F) -> Result<R>
    where
        F: FnOnce(&Store) -> Result<R>,
    {
        let store = Store::open(config)?;
        let outcome = f(&store);
        let closed = store.close();
        match (outcome, closed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    tracing::warn!(error = %close_err, "close after failed scope also failed");
                }
                Err(err)
            }
        }
    }

    pub fn id(&self) -> &StoreId {
        &self.id
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.lock().conn.is_some()
    }

    pub fn in_transaction(&self) -> bool {
        self.lock().journal.is_some()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wrap `f` in start/end/error events for `op`
    pub(crate) fn instrumented<R>(
        &self,
        op: &'static str,
        table: Option<&str>,
        f: impl FnOnce() -> Result<R>,
    ) -> Result<R> {
        log_op_start!(op, table = table, store_id = self.id.as_str());
        let start = Instant::now();

        let result = f().map_err(|e| {
            log_op_error!(
                op,
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                table = table,
                store_id = self.id.as_str()
            );
            e
        })?;

        log_op_end!(
            op,
            duration_ms = start.elapsed().as_millis() as u64,
            table = table,
            store_id = self.id.as_str()
        );
        Ok(result)
    }

    /// Close the store
    ///
    /// Rolls back an open transaction, vacuums when configured to, and
    /// releases the connection. Closing a closed store is a no-op; every
    /// other operation on it fails `StoreClosed`.
    ///
    /// # Errors
    ///
    /// Returns `Backend` when vacuuming or closing the connection fails; the
    /// connection is released either way.
    pub fn close(&self) -> Result<()> {
        self.instrumented("close", None, || self.close_impl())
    }

    fn close_impl(&self) -> Result<()> {
        let mut inner = self.lock();
        if inner.conn.is_none() {
            return Ok(());
        }
        if let Some(journal) = inner.journal.take() {
            inner.rollback(journal);
        }

        let vacuumed = if self.config.vacuum_on_close {
            inner.execute("close", "VACUUM", &[]).map(|_| ())
        } else {
            Ok(())
        };

        inner.cache.clear();
        inner.registry.clear();
        let closed = match inner.conn.take() {
            Some(conn) => conn.close().map_err(|(_, e)| from_rusqlite(e)),
            None => Ok(()),
        };
        vacuumed.and(closed)
    }

    /// Register a model type, creating its table
    ///
    /// Idempotent: registering an already registered type issues no DDL.
    ///
    /// # Errors
    ///
    /// - `TableConflict` when another type already maps to the same table
    /// - any introspection failure of `T`
    /// - `StoreClosed`, `Backend`
    pub fn register<T: Model>(&self) -> Result<()> {
        self.register_type(&RecordType::of::<T>())
    }

    /// Register a record type known only at runtime
    ///
    /// # Errors
    ///
    /// Returns `NotAModel` for a plain declaration, otherwise see
    /// [`Store::register`].
    pub fn register_type(&self, record_type: &RecordType) -> Result<()> {
        self.instrumented("register", Some(record_type.type_name()), || {
            let mut inner = self.lock();
            inner.conn("register")?;
            inner.register(record_type).map(|_| ())
        })
    }

    pub fn is_registered<T: Model>(&self) -> bool {
        self.lock()
            .registry
            .contains(std::any::TypeId::of::<T>())
    }

    /// Persist an instance
    ///
    /// A fresh instance is inserted and stamped with the new row id; an
    /// instance with an id updates that row and keeps its id. Either way the
    /// identity cache remembers the instance afterwards.
    ///
    /// # Errors
    ///
    /// - `UnknownClass` when `T` is unregistered and autoregister is off
    /// - `TypeMismatch` when a column value does not fit its field
    /// - `NotFound` when the row of an already saved instance is gone
    /// - `StoreClosed`, `Backend`
    pub fn save<T: Model>(&self, instance: &Instance<T>) -> Result<RowId> {
        log_op_start!("save", table = T::type_name(), store_id = self.id.as_str());
        let start = Instant::now();

        let row_id = self.save_impl(instance).map_err(|e| {
            log_op_error!(
                "save",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64,
                table = T::type_name(),
                store_id = self.id.as_str()
            );
            e
        })?;

        log_op_end!(
            "save",
            duration_ms = start.elapsed().as_millis() as u64,
            row_id = row_id,
            store_id = self.id.as_str()
        );
        Ok(row_id)
    }

    fn save_impl<T: Model>(&self, instance: &Instance<T>) -> Result<RowId> {
        let mut inner = self.lock();
        let meta =
            inner.ensure_registered("save", &RecordType::of::<T>(), self.config.autoregister)?;

        let (id, mut values) = {
            let record = instance.read();
            (record.id(), column_values(&meta, &*record)?)
        };

        match id {
            None => {
                inner.execute("save", &sql::insert(&meta), &values)?;
                let id = inner.conn("save")?.last_insert_rowid();
                instance.write().set_id(Some(id));
                inner.cache.remember(id, instance);
                if let Some(journal) = inner.journal.as_mut() {
                    journal.inserted(id, instance);
                }
                Ok(id)
            }
            Some(id) => {
                let found = match sql::update(&meta) {
                    Some(update) => {
                        values.push(Value::Integer(id));
                        inner.execute("save", &update, &values)? > 0
                    }
                    None => inner.exists("save", &sql::exists_by_id(&meta), &[Value::Integer(id)])?,
                };
                if !found {
                    return Err(MinidbError::RowNotFound {
                        table: meta.table().to_string(),
                        row_id: id,
                    }
                    .into());
                }
                inner.cache.remember(id, instance);
                Ok(id)
            }
        }
    }

    /// Delete the row of a saved instance
    ///
    /// The instance loses its id and its cache entry; returns whether a row
    /// was actually removed.
    ///
    /// # Errors
    ///
    /// - `NotPersisted` when the instance has no id
    /// - `UnknownClass`, `StoreClosed`, `Backend`
    pub fn delete<T: Model>(&self, instance: &Instance<T>) -> Result<bool> {
        self.instrumented("delete", Some(T::type_name()), || {
            let mut inner = self.lock();
            inner.conn("delete")?;
            let id = instance.id().ok_or_else(|| MinidbError::NotPersisted {
                type_name: T::type_name().to_string(),
            })?;
            let meta = inner.ensure_registered(
                "delete",
                &RecordType::of::<T>(),
                self.config.autoregister,
            )?;

            let removed = inner.execute("delete", &sql::delete_by_id(&meta), &[Value::Integer(id)])?;

            instance.write().set_id(None);
            inner.cache.forget::<T>(id);
            if let Some(journal) = inner.journal.as_mut() {
                journal.deleted(id, instance);
            }
            Ok(removed > 0)
        })
    }

    /// Delete every row matching `predicate`, returning how many went
    ///
    /// Live cached instances of the deleted rows lose their id.
    ///
    /// # Errors
    ///
    /// - `UnknownField` for a column `T` does not declare
    /// - `UnknownClass`, `StoreClosed`, `Backend`
    pub fn delete_where<T: Model>(&self, predicate: Predicate<T>) -> Result<usize> {
        self.instrumented("delete_where", Some(T::type_name()), || {
            let mut inner = self.lock();
            let meta = inner.ensure_registered(
                "delete_where",
                &RecordType::of::<T>(),
                self.config.autoregister,
            )?;
            for column in predicate.expr().columns() {
                meta.require_column(column)?;
            }

            let select = sql::select_ids(&meta, predicate.expr());
            let id_column = [OutputColumn {
                name: ID_COLUMN.to_string(),
                kind: Some(FieldKind::Integer),
            }];
            let ids: Vec<RowId> = inner
                .fetch("delete_where", &select.sql, &select.params, &id_column)?
                .iter()
                .filter_map(ResultRow::id)
                .collect();

            let delete = sql::delete_where(&meta, predicate.expr());
            let removed = inner.execute("delete_where", &delete.sql, &delete.params)?;

            let StoreInner { cache, journal, .. } = &mut *inner;
            for id in ids {
                if let Some(instance) = cache.lookup::<T>(id) {
                    instance.write().set_id(None);
                    if let Some(journal) = journal.as_mut() {
                        journal.deleted(id, &instance);
                    }
                }
                cache.forget::<T>(id);
            }
            Ok(removed)
        })
    }

    /// Number of rows of `T`, optionally restricted by `filter`
    ///
    /// # Errors
    ///
    /// - `UnknownField` for a column `T` does not declare
    /// - `UnknownClass`, `StoreClosed`, `Backend`
    pub fn count<T: Model>(&self, filter: Option<Predicate<T>>) -> Result<u64> {
        let mut select = Select::aggregate(T::c(ID_COLUMN).count("count"));
        if let Some(filter) = filter {
            select = select.filter(filter);
        }
        let row = select
            .query(self)?
            .next()
            .ok_or_else(|| internal("count", "aggregate returned no row"))?;
        let count = row.get("count").and_then(Value::as_integer).unwrap_or(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Run `f` inside a database transaction
    ///
    /// Commits when `f` returns `Ok`. On `Err` the transaction is rolled back
    /// and the in-memory effects of saves and deletes made inside it are
    /// undone: ids assigned by inserts are cleared, ids cleared by deletes are
    /// restored. The store lock is not held while `f` runs, so statements
    /// from other threads sharing the store join the transaction.
    ///
    /// # Errors
    ///
    /// - `TransactionActive` when a transaction is already open
    /// - whatever `f` returns
    /// - `StoreClosed`, `Backend`
    pub fn transaction<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Store) -> Result<R>,
    {
        self.instrumented("transaction", None, || self.transaction_impl(f))
    }

    fn transaction_impl<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Store) -> Result<R>,
    {
        {
            let mut inner = self.lock();
            inner.conn("transaction")?;
            if inner.journal.is_some() {
                return Err(transaction_active());
            }
            inner.execute("transaction", "BEGIN", &[])?;
            inner.journal = Some(Journal::new());
        }

        let guard = UnwindRollback { store: self };
        let outcome = f(self);
        std::mem::forget(guard);

        let mut inner = self.lock();
        let Some(journal) = inner.journal.take() else {
            // Closed from inside; close already rolled back
            return outcome.and_then(|_| Err(store_closed("transaction")));
        };
        match outcome {
            Ok(value) => match inner.execute("transaction", "COMMIT", &[]) {
                Ok(_) => Ok(value),
                Err(err) => {
                    inner.rollback(journal);
                    Err(err)
                }
            },
            Err(err) => {
                inner.rollback(journal);
                Err(err)
            }
        }
    }
}

/// Rolls the open transaction back if its closure panics
struct UnwindRollback<'s> {
    store: &'s Store,
}

impl Drop for UnwindRollback<'_> {
    fn drop(&mut self) {
        let mut inner = self.store.lock();
        if let Some(journal) = inner.journal.take() {
            tracing::warn!(
                store_id = self.store.id.as_str(),
                "transaction closure panicked, rolling back"
            );
            inner.rollback(journal);
        }
    }
}

impl QueryExecutor for Store {
    fn execute(&self, query: &CompiledQuery) -> Result<Rows> {
        let mut inner = self.lock();
        inner.ensure_registered("query", &query.record_type, self.config.autoregister)?;
        let rows = inner.fetch("query", &query.sql, &query.params, &query.columns)?;
        tracing::debug!(
            table = query.meta.table(),
            row_count = rows.len(),
            store_id = self.id.as_str(),
            "query returned"
        );
        Ok(Rows::new(rows))
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(err) = self.close() {
                tracing::warn!(error = %err, store_id = self.id.as_str(), "close on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Persisted values of `record` in field order, checked against field kinds
fn column_values<T: Model>(meta: &RecordMeta, record: &T) -> Result<Vec<Value>> {
    meta.fields()
        .iter()
        .map(|field| -> Result<Value> {
            let value = record
                .column(field.name)
                .ok_or_else(|| MinidbError::UnknownField {
                    type_name: meta.type_name().to_string(),
                    field: field.name.to_string(),
                })?;
            Ok(value.coerce(field.name, field.kind)?)
        })
        .collect()
}
