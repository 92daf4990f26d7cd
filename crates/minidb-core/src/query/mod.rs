//! Query builder
//!
//! Column handles build an immutable predicate/aggregate tree; a [`Select`]
//! compiles it against the record type's metadata into a parameterized
//! statement, and a [`QueryExecutor`] runs that statement.

pub mod expr;
pub mod rows;
pub mod select;
pub mod sql;

pub use expr::{Aggregate, AggregateFn, Column, CompareOp, Expr, Ordering, Predicate};
pub use rows::{ResultRow, Rows};
pub use select::{CompiledQuery, OutputColumn, Select};
pub use sql::Statement;

use crate::errors::Result;

/// Something that can run compiled queries, in practice an open store
pub trait QueryExecutor {
    /// Run `query` and return its rows
    ///
    /// Implementations are expected to make sure the record type is
    /// registered (or fail with `UnknownClass`) before touching its table.
    ///
    /// # Errors
    ///
    /// Implementation specific; engine failures surface as `Backend`.
    fn execute(&self, query: &CompiledQuery) -> Result<Rows>;
}
