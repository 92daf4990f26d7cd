//! Core types shared across minidb crates
//!
//! - **Correlation types**: StoreId tags every event a store emits
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::StoreId;
