use thiserror::Error;

/// Result type alias using MdError
pub type Result<T> = std::result::Result<T, MdError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable for programmatic handling
/// and test assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MdErrorKind {
    // Registration
    /// Save or query against an unregistered type while autoregister is off
    UnknownClass,
    /// The definition handed to `register` is not a model
    NotAModel,
    /// Two record types resolve to the same table
    TableConflict,

    // Declaration / introspection
    /// A declared type marker is not one of the persisted kinds
    InvalidFieldType,
    /// A persisted field is declared twice or shadows `id`
    DuplicateField,
    /// A table, field or alias name is not a plain SQL identifier
    InvalidIdentifier,

    // Values / queries
    /// A name does not match any declared field
    UnknownField,
    /// A value kind does not fit the field it is written to
    TypeMismatch,
    /// A single-row lookup matched more than one row
    AmbiguousResult,
    NotFound,
    /// The instance has never been saved
    NotPersisted,

    // Store lifecycle
    StoreClosed,
    TransactionActive,

    // Integration/IO
    /// Engine-level failure, message passed through untranslated
    Backend,
    Config,
    Io,

    // Internal
    Internal,
}

impl MdErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            MdErrorKind::UnknownClass => "ERR_UNKNOWN_CLASS",
            MdErrorKind::NotAModel => "ERR_NOT_A_MODEL",
            MdErrorKind::TableConflict => "ERR_TABLE_CONFLICT",
            MdErrorKind::InvalidFieldType => "ERR_INVALID_FIELD_TYPE",
            MdErrorKind::DuplicateField => "ERR_DUPLICATE_FIELD",
            MdErrorKind::InvalidIdentifier => "ERR_INVALID_IDENTIFIER",
            MdErrorKind::UnknownField => "ERR_UNKNOWN_FIELD",
            MdErrorKind::TypeMismatch => "ERR_TYPE_MISMATCH",
            MdErrorKind::AmbiguousResult => "ERR_AMBIGUOUS_RESULT",
            MdErrorKind::NotFound => "ERR_NOT_FOUND",
            MdErrorKind::NotPersisted => "ERR_NOT_PERSISTED",
            MdErrorKind::StoreClosed => "ERR_STORE_CLOSED",
            MdErrorKind::TransactionActive => "ERR_TRANSACTION_ACTIVE",
            MdErrorKind::Backend => "ERR_BACKEND",
            MdErrorKind::Config => "ERR_CONFIG",
            MdErrorKind::Io => "ERR_IO",
            MdErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling plus the context
/// (operation, table, field) needed to debug the failure.
#[derive(Debug, Clone)]
pub struct MdError {
    kind: MdErrorKind,
    op: Option<String>,
    table: Option<String>,
    field: Option<String>,
    row_id: Option<i64>,
    message: String,
    source: Option<Box<MdError>>,
}

impl MdError {
    /// Create a new error with the specified kind
    pub fn new(kind: MdErrorKind) -> Self {
        Self {
            kind,
            op: None,
            table: None,
            field: None,
            row_id: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add table (or record type) context
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    /// Add field context
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Add row id context
    pub fn with_row_id(mut self, row_id: i64) -> Self {
        self.row_id = Some(row_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: MdError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> MdErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Get the operation context, if any
    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    /// Get the table context, if any
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Get the field context, if any
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Get the row id context, if any
    pub fn row_id(&self) -> Option<i64> {
        self.row_id
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&MdError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for MdError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(table) = &self.table {
            write!(f, " (table: {})", table)?;
        }
        if let Some(field) = &self.field {
            write!(f, " (field: {})", field)?;
        }
        if let Some(row_id) = self.row_id {
            write!(f, " (row_id: {})", row_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for MdError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Domain failures raised by the mapping layer
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MinidbError {
    /// Type used before registration with autoregister disabled
    #[error("Record type {type_name} is not registered")]
    UnknownClass { type_name: String },

    /// Definition does not implement the model protocol
    #[error("{type_name} is not a model and cannot be registered")]
    NotAModel { type_name: String },

    /// Two record types resolve to one table
    #[error("Table {table} is already mapped to {existing}")]
    TableConflict { table: String, existing: String },

    /// Declared marker is not a persisted kind
    #[error("Field {field} of {type_name} uses unrecognized type marker '{marker}'")]
    InvalidFieldType {
        type_name: String,
        field: String,
        marker: String,
    },

    /// Persisted field declared twice or named like the row id
    #[error("Field {field} of {type_name} is declared more than once")]
    DuplicateField { type_name: String, field: String },

    /// Name cannot be used as a SQL identifier
    #[error("'{name}' is not a valid identifier")]
    InvalidIdentifier { name: String },

    /// Name is not a declared field of the record type
    #[error("{type_name} has no field named {field}")]
    UnknownField { type_name: String, field: String },

    /// Value kind does not match the declared field kind
    #[error("Field {field} expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },

    /// Single-row lookup matched several rows
    #[error("Expected at most one row from {table}, found {count}")]
    AmbiguousResult { table: String, count: usize },

    /// Row no longer exists
    #[error("Row {row_id} not found in {table}")]
    RowNotFound { table: String, row_id: i64 },

    /// Instance has no row id
    #[error("Instance of {type_name} has not been saved")]
    NotPersisted { type_name: String },
}

impl From<MinidbError> for MdError {
    fn from(err: MinidbError) -> Self {
        let message = err.to_string();
        let structured = match err {
            MinidbError::UnknownClass { type_name } => {
                MdError::new(MdErrorKind::UnknownClass).with_table(type_name)
            }
            MinidbError::NotAModel { type_name } => {
                MdError::new(MdErrorKind::NotAModel).with_table(type_name)
            }
            MinidbError::TableConflict { table, .. } => {
                MdError::new(MdErrorKind::TableConflict).with_table(table)
            }
            MinidbError::InvalidFieldType {
                type_name, field, ..
            } => MdError::new(MdErrorKind::InvalidFieldType)
                .with_table(type_name)
                .with_field(field),
            MinidbError::DuplicateField { type_name, field } => {
                MdError::new(MdErrorKind::DuplicateField)
                    .with_table(type_name)
                    .with_field(field)
            }
            MinidbError::InvalidIdentifier { .. } => {
                MdError::new(MdErrorKind::InvalidIdentifier)
            }
            MinidbError::UnknownField { type_name, field } => {
                MdError::new(MdErrorKind::UnknownField)
                    .with_table(type_name)
                    .with_field(field)
            }
            MinidbError::TypeMismatch { field, .. } => {
                MdError::new(MdErrorKind::TypeMismatch).with_field(field)
            }
            MinidbError::AmbiguousResult { table, .. } => {
                MdError::new(MdErrorKind::AmbiguousResult).with_table(table)
            }
            MinidbError::RowNotFound { table, row_id } => MdError::new(MdErrorKind::NotFound)
                .with_table(table)
                .with_row_id(row_id),
            MinidbError::NotPersisted { type_name } => {
                MdError::new(MdErrorKind::NotPersisted).with_table(type_name)
            }
        };
        structured.with_message(message)
    }
}
