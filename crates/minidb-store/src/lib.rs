//! minidb store - SQLite-backed sessions for minidb record types
//!
//! Provides:
//! - `Store`: connection, schema registry, identity cache and transactions
//! - Materializers that turn query rows into shared instances
//! - TOML-backed store configuration
//! - Catalog inspection of an existing database file

pub mod catalog;
pub mod config;
pub mod db;
pub mod errors;
pub mod journal;
pub mod materialize;
pub mod registry;
pub mod store;

// Re-export key types
pub use catalog::{ColumnInfo, TableInfo};
pub use config::StoreConfig;
pub use errors::Result;
pub use materialize::{Hydrate, InstanceStoreExt, Loader, Materializer, ModelStoreExt};
pub use store::Store;
