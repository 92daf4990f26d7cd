//! minidb core - record introspection, identity cache and query building
//!
//! This crate holds everything about the mapping layer that does not need a
//! live database:
//! - Record declaration surface (`Declared`, `Model`) and shared `Instance` handles
//! - Field introspection with a process-wide metadata cache
//! - The weak identity cache keyed by (record type, row id)
//! - The query builder and its rendering to parameterized SQL
//! - Error and logging facilities shared by every minidb crate

pub mod errors;
pub mod identity;
pub mod introspect;
pub mod logging_facility;
pub mod model;
pub mod query;

// Re-export commonly used types
pub use errors::{MdError, MdErrorKind, MinidbError, Result};
pub use identity::IdentityCache;
pub use introspect::{describe, describe_type, FieldDescriptor, RecordMeta};
pub use model::{
    Attribute, ColumnValue, Declaration, Declared, FieldKind, Instance, Model, RecordType, RowId,
    TypeMarker, Value,
};
pub use query::{Aggregate, Column, Predicate, QueryExecutor, ResultRow, Rows, Select};
