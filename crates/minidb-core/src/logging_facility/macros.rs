//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use minidb_core::log_op_start;
/// log_op_start!("save");
/// log_op_start!("save", table = "FieldTest");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = minidb_core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = minidb_core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use minidb_core::log_op_end;
/// log_op_end!("save", duration_ms = 42, row_id = 7);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = minidb_core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        tracing::info!(
            component = module_path!(),
            op = $op,
            event = minidb_core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// # Example
///
/// ```
/// # use minidb_core::{log_op_error, errors::MinidbError};
/// let err = MinidbError::UnknownClass { type_name: "FieldTest".to_string() };
/// log_op_error!("save", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        use $crate::errors::MdError;
        let md_err: MdError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = minidb_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?md_err.kind(),
            err_code = md_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::errors::MdError;
        let md_err: MdError = $err.into();
        tracing::error!(
            component = module_path!(),
            op = $op,
            event = minidb_core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?md_err.kind(),
            err_code = md_err.code(),
            $($field)*
        );
    }};
}
