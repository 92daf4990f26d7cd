use serde::{Deserialize, Serialize};

use crate::errors::MinidbError;

/// Persisted column kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Integer,
    Real,
    Boolean,
}

impl FieldKind {
    /// Declared SQL type used in `CREATE TABLE`
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldKind::Text => "TEXT",
            FieldKind::Integer => "INTEGER",
            FieldKind::Real => "REAL",
            FieldKind::Boolean => "BOOLEAN",
        }
    }

    /// Canonical lowercase name, also the canonical marker name
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Integer => "integer",
            FieldKind::Real => "real",
            FieldKind::Boolean => "boolean",
        }
    }

    /// Resolve a marker name to a kind
    ///
    /// Accepts the canonical names plus the common aliases `str`, `string`,
    /// `int`, `i64`, `float`, `f64` and `bool`.
    pub fn from_marker(name: &str) -> Option<Self> {
        match name {
            "text" | "str" | "string" => Some(FieldKind::Text),
            "integer" | "int" | "i64" => Some(FieldKind::Integer),
            "real" | "float" | "f64" => Some(FieldKind::Real),
            "boolean" | "bool" => Some(FieldKind::Boolean),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A single column value as it travels between records and the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Kind of a non-null value
    pub fn kind(&self) -> Option<FieldKind> {
        match self {
            Value::Null => None,
            Value::Text(_) => Some(FieldKind::Text),
            Value::Integer(_) => Some(FieldKind::Integer),
            Value::Real(_) => Some(FieldKind::Real),
            Value::Boolean(_) => Some(FieldKind::Boolean),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric view; integers widen to floats
    pub fn as_real(&self) -> Option<f64> {
        match self {
            Value::Real(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Whether this value may be stored in a column of `kind`
    ///
    /// Null fits every kind and integers fit real columns.
    pub fn fits(&self, kind: FieldKind) -> bool {
        match (self, kind) {
            (Value::Null, _) => true,
            (Value::Integer(_), FieldKind::Real) => true,
            (value, kind) => value.kind() == Some(kind),
        }
    }

    /// Coerce into the representation used for `kind`
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` when the value does not fit the kind.
    pub fn coerce(self, field: &str, kind: FieldKind) -> Result<Value, MinidbError> {
        match (self, kind) {
            (Value::Integer(i), FieldKind::Real) => Ok(Value::Real(i as f64)),
            (value, kind) if value.fits(kind) => Ok(value),
            (value, kind) => Err(MinidbError::TypeMismatch {
                field: field.to_string(),
                expected: kind.to_string(),
                actual: value.kind_name().to_string(),
            }),
        }
    }

    fn kind_name(&self) -> &'static str {
        self.kind().map(|k| k.name()).unwrap_or("null")
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{}", r),
            Value::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Rust field types that can back a persisted column
///
/// Columns are nullable, so the implementations are for `Option<_>`: a fresh
/// record holds `None` until user code or a load fills it in.
pub trait ColumnValue: Sized {
    /// Kind of column this type maps to
    const KIND: FieldKind;

    fn to_value(&self) -> Value;

    /// # Errors
    ///
    /// Returns `TypeMismatch` when `value` is of another kind.
    fn from_value(field: &str, value: Value) -> Result<Self, MinidbError>;
}

fn mismatch(field: &str, expected: FieldKind, value: &Value) -> MinidbError {
    MinidbError::TypeMismatch {
        field: field.to_string(),
        expected: expected.to_string(),
        actual: value.kind_name().to_string(),
    }
}

impl ColumnValue for Option<String> {
    const KIND: FieldKind = FieldKind::Text;

    fn to_value(&self) -> Value {
        self.clone().into()
    }

    fn from_value(field: &str, value: Value) -> Result<Self, MinidbError> {
        match value {
            Value::Null => Ok(None),
            Value::Text(s) => Ok(Some(s)),
            other => Err(mismatch(field, Self::KIND, &other)),
        }
    }
}

impl ColumnValue for Option<i64> {
    const KIND: FieldKind = FieldKind::Integer;

    fn to_value(&self) -> Value {
        (*self).into()
    }

    fn from_value(field: &str, value: Value) -> Result<Self, MinidbError> {
        match value {
            Value::Null => Ok(None),
            Value::Integer(i) => Ok(Some(i)),
            other => Err(mismatch(field, Self::KIND, &other)),
        }
    }
}

impl ColumnValue for Option<f64> {
    const KIND: FieldKind = FieldKind::Real;

    fn to_value(&self) -> Value {
        (*self).into()
    }

    fn from_value(field: &str, value: Value) -> Result<Self, MinidbError> {
        match value {
            Value::Null => Ok(None),
            Value::Real(f) => Ok(Some(f)),
            Value::Integer(i) => Ok(Some(i as f64)),
            other => Err(mismatch(field, Self::KIND, &other)),
        }
    }
}

impl ColumnValue for Option<bool> {
    const KIND: FieldKind = FieldKind::Boolean;

    fn to_value(&self) -> Value {
        (*self).into()
    }

    fn from_value(field: &str, value: Value) -> Result<Self, MinidbError> {
        match value {
            Value::Null => Ok(None),
            Value::Boolean(b) => Ok(Some(b)),
            other => Err(mismatch(field, Self::KIND, &other)),
        }
    }
}
