//! Catalog inspection
//!
//! Read-only views of whatever tables a database file holds, whether or not
//! a record type for them is registered in this process.

use minidb_core::query::sql::quote_ident;
use minidb_core::query::OutputColumn;
use minidb_core::{FieldKind, Rows, Value};
use serde::Serialize;

use crate::db::kind_for_declared;
use crate::errors::{unknown_table, Result};
use crate::store::{Store, StoreInner};

const LIST_TABLES: &str =
    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";

const TABLE_COLUMNS: &str = "SELECT name, type FROM pragma_table_info(?) ORDER BY cid";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    /// Declared SQL type as written in the DDL
    pub declared_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
    pub name: String,
    pub columns: Vec<ColumnInfo>,
}

impl Store {
    /// Every user table with its columns, sorted by name
    ///
    /// # Errors
    ///
    /// `StoreClosed`, `Backend`
    pub fn tables(&self) -> Result<Vec<TableInfo>> {
        let inner = self.lock();
        let rows = inner.fetch("tables", LIST_TABLES, &[], &[text_column("name")])?;
        rows.iter()
            .filter_map(|row| row.get("name").and_then(Value::as_text))
            .map(|name| {
                Ok(TableInfo {
                    name: name.to_string(),
                    columns: table_columns(&inner, name)?,
                })
            })
            .collect()
    }

    /// Number of rows in `table`
    ///
    /// # Errors
    ///
    /// `NotFound` for a table the database does not have, `StoreClosed`,
    /// `Backend`
    pub fn count_rows(&self, table: &str) -> Result<u64> {
        let inner = self.lock();
        require_table(&inner, table)?;
        let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table));
        let column = OutputColumn {
            name: "count".to_string(),
            kind: Some(FieldKind::Integer),
        };
        let count = inner
            .fetch("count_rows", &sql, &[], &[column])?
            .first()
            .and_then(|row| row.get("count").and_then(Value::as_integer))
            .unwrap_or(0);
        Ok(u64::try_from(count).unwrap_or(0))
    }

    /// Raw rows of `table` in storage order, decoded by declared column type
    ///
    /// # Errors
    ///
    /// `NotFound` for a table the database does not have, `StoreClosed`,
    /// `Backend`
    pub fn dump(&self, table: &str, limit: Option<u64>) -> Result<Rows> {
        let inner = self.lock();
        let columns: Vec<OutputColumn> = require_table(&inner, table)?
            .into_iter()
            .map(|c| OutputColumn {
                kind: kind_for_declared(&c.declared_type),
                name: c.name,
            })
            .collect();

        let select_list: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
        let mut sql = format!(
            "SELECT {} FROM {}",
            select_list.join(", "),
            quote_ident(table)
        );
        let mut params = Vec::new();
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            params.push(Value::Integer(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        let rows = inner.fetch("dump", &sql, &params, &columns)?;
        Ok(Rows::new(rows))
    }
}

fn text_column(name: &str) -> OutputColumn {
    OutputColumn {
        name: name.to_string(),
        kind: Some(FieldKind::Text),
    }
}

fn table_columns(inner: &StoreInner, table: &str) -> Result<Vec<ColumnInfo>> {
    let rows = inner.fetch(
        "table_columns",
        TABLE_COLUMNS,
        &[Value::from(table)],
        &[text_column("name"), text_column("type")],
    )?;
    Ok(rows
        .iter()
        .map(|row| ColumnInfo {
            name: row
                .get("name")
                .and_then(Value::as_text)
                .unwrap_or_default()
                .to_string(),
            declared_type: row
                .get("type")
                .and_then(Value::as_text)
                .unwrap_or_default()
                .to_string(),
        })
        .collect())
}

/// Columns of `table`, failing `NotFound` when it does not exist
fn require_table(inner: &StoreInner, table: &str) -> Result<Vec<ColumnInfo>> {
    let columns = table_columns(inner, table)?;
    if columns.is_empty() {
        return Err(unknown_table(table));
    }
    Ok(columns)
}
