//! Database connection management
//!
//! Opening and configuring connections, converting values to and from the
//! engine, and echoing statements.

use std::time::Duration;

use minidb_core::query::OutputColumn;
use minidb_core::{FieldKind, ResultRow, Value};
use minidb_core_types::schema::{EVENT_STATEMENT, OP_SQL};
use minidb_core_types::StoreId;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection, OpenFlags};

use crate::config::StoreConfig;
use crate::errors::{from_rusqlite, internal, missing_database, Result};

/// Open the database a configuration points at
///
/// With `create_if_missing` off, a missing file is `NotFound` and is left
/// uncreated.
pub fn open(config: &StoreConfig) -> Result<Connection> {
    let conn = match &config.path {
        Some(path) if config.create_if_missing => Connection::open(path),
        Some(path) => {
            if !path.exists() {
                return Err(missing_database(path));
            }
            let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX;
            Connection::open_with_flags(path, flags)
        }
        None => Connection::open_in_memory(),
    }
    .map_err(from_rusqlite)?;
    configure(&conn, config)?;
    Ok(conn)
}

/// Configure a connection with the store settings
///
/// File databases switch to WAL journaling; in-memory databases keep the
/// engine default.
pub fn configure(conn: &Connection, config: &StoreConfig) -> Result<()> {
    conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(from_rusqlite)?;

    if config.path.is_some() {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(from_rusqlite)?;
        tracing::debug!(journal_mode = %mode, "configured file database");
    }

    Ok(())
}

/// Engine representation of a value; booleans are stored as 0/1
pub fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(f) => SqlValue::Real(*f),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

/// Decode an engine value for a column of `kind`
///
/// Without a kind the engine's own storage class is kept.
pub fn decode(raw: ValueRef<'_>, kind: Option<FieldKind>) -> Result<Value> {
    Ok(match (raw, kind) {
        (ValueRef::Null, _) => Value::Null,
        (ValueRef::Integer(i), Some(FieldKind::Boolean)) => Value::Boolean(i != 0),
        (ValueRef::Integer(i), Some(FieldKind::Real)) => Value::Real(i as f64),
        (ValueRef::Integer(i), _) => Value::Integer(i),
        (ValueRef::Real(f), _) => Value::Real(f),
        (ValueRef::Text(bytes), _) => Value::Text(
            std::str::from_utf8(bytes)
                .map_err(|e| internal("decode", &format!("column is not UTF-8: {}", e)))?
                .to_string(),
        ),
        (ValueRef::Blob(_), _) => return Err(internal("decode", "blob columns are not supported")),
    })
}

/// Declared SQL type back to a field kind, as created by minidb
pub fn kind_for_declared(declared: &str) -> Option<FieldKind> {
    match declared.to_ascii_uppercase().as_str() {
        "TEXT" => Some(FieldKind::Text),
        "INTEGER" => Some(FieldKind::Integer),
        "REAL" => Some(FieldKind::Real),
        "BOOLEAN" => Some(FieldKind::Boolean),
        _ => None,
    }
}

/// Emit one event for a statement about to run
///
/// With `debug` on the event goes out at info level, otherwise at trace.
pub fn echo(debug: bool, store_id: &StoreId, sql: &str, params: &[Value]) {
    if debug {
        tracing::info!(
            component = module_path!(),
            op = OP_SQL,
            event = EVENT_STATEMENT,
            store_id = store_id.as_str(),
            sql,
            params = ?params,
        );
    } else {
        tracing::trace!(
            component = module_path!(),
            op = OP_SQL,
            event = EVENT_STATEMENT,
            store_id = store_id.as_str(),
            sql,
            params = ?params,
        );
    }
}

/// Run a statement that returns no rows, reporting the affected row count
pub fn execute(conn: &Connection, sql: &str, params: &[Value]) -> Result<usize> {
    conn.execute(sql, params_from_iter(params.iter().map(to_sql)))
        .map_err(from_rusqlite)
}

/// Whether a query returns at least one row
pub fn exists(conn: &Connection, sql: &str, params: &[Value]) -> Result<bool> {
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    stmt.exists(params_from_iter(params.iter().map(to_sql)))
        .map_err(from_rusqlite)
}

/// Run a query and decode every row according to `columns`
pub fn fetch(
    conn: &Connection,
    sql: &str,
    params: &[Value],
    columns: &[OutputColumn],
) -> Result<Vec<ResultRow>> {
    let mut stmt = conn.prepare(sql).map_err(from_rusqlite)?;
    let mut rows = stmt
        .query(params_from_iter(params.iter().map(to_sql)))
        .map_err(from_rusqlite)?;

    let mut out = Vec::new();
    while let Some(row) = rows.next().map_err(from_rusqlite)? {
        let mut values = Vec::with_capacity(columns.len());
        for (index, column) in columns.iter().enumerate() {
            let raw = row.get_ref(index).map_err(from_rusqlite)?;
            values.push((column.name.clone(), decode(raw, column.kind)?));
        }
        out.push(ResultRow::new(values));
    }
    Ok(out)
}
