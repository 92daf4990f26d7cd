//! Error handling for minidb-store
//!
//! Wraps minidb-core MdError with store-specific helpers

use minidb_core::errors::{MdError, MdErrorKind};

/// Result type alias using MdError
pub type Result<T> = std::result::Result<T, MdError>;

/// Create a database error from rusqlite::Error
///
/// The engine message is passed through untranslated.
pub fn from_rusqlite(err: rusqlite::Error) -> MdError {
    MdError::new(MdErrorKind::Backend)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create an error for an operation on a closed store
pub fn store_closed(operation: &str) -> MdError {
    MdError::new(MdErrorKind::StoreClosed)
        .with_op(operation.to_string())
        .with_message("store is closed")
}

/// Create an error for a transaction started inside another
pub fn transaction_active() -> MdError {
    MdError::new(MdErrorKind::TransactionActive)
        .with_op("transaction")
        .with_message("a transaction is already active on this store")
}

/// Create an error for a catalog table that does not exist
pub fn unknown_table(table: &str) -> MdError {
    MdError::new(MdErrorKind::NotFound)
        .with_op("catalog")
        .with_table(table.to_string())
        .with_message(format!("No table named {}", table))
}

/// Create an error for a database file that does not exist
pub fn missing_database(path: &std::path::Path) -> MdError {
    MdError::new(MdErrorKind::NotFound)
        .with_op("open")
        .with_message(format!("No database file at {}", path.display()))
}

/// Create an invariant-breach error
pub fn internal(operation: &str, reason: &str) -> MdError {
    MdError::new(MdErrorKind::Internal)
        .with_op(operation.to_string())
        .with_message(reason.to_string())
}

/// Create a configuration error
pub fn config_error(reason: &str) -> MdError {
    MdError::new(MdErrorKind::Config)
        .with_op("config")
        .with_message(reason.to_string())
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> MdError {
    MdError::new(MdErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}
