use std::any::TypeId;

use crate::errors::MinidbError;
use crate::query::Column;

use super::value::{FieldKind, Value};

/// Row identifier assigned by the engine on first insert
pub type RowId = i64;

/// Prefix marking an attribute as private, never persisted
pub const PRIVATE_PREFIX: char = '_';

/// Name of the implicit primary-key column
pub const ID_COLUMN: &str = "id";

/// Declared type of an attribute, identified by name
///
/// The four persisted kinds have constants; anything else can be expressed
/// with [`TypeMarker::named`] and is rejected at introspection time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeMarker(&'static str);

impl TypeMarker {
    pub const TEXT: TypeMarker = TypeMarker("text");
    pub const INTEGER: TypeMarker = TypeMarker("integer");
    pub const REAL: TypeMarker = TypeMarker("real");
    pub const BOOLEAN: TypeMarker = TypeMarker("boolean");

    pub const fn named(name: &'static str) -> Self {
        TypeMarker(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }

    /// The persisted kind this marker stands for, if any
    pub fn kind(&self) -> Option<FieldKind> {
        FieldKind::from_marker(self.0)
    }
}

impl From<FieldKind> for TypeMarker {
    fn from(kind: FieldKind) -> Self {
        TypeMarker(kind.name())
    }
}

/// What an attribute is, as far as persistence cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Declaration {
    /// A type marker; persisted unless the name is private
    Marker(TypeMarker),
    /// A class-level value that is not a type marker
    Constant,
    /// A method, class method or static method
    Callable,
    /// A computed property
    Property,
}

/// One declared attribute of a record type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute {
    pub name: &'static str,
    pub declaration: Declaration,
}

impl Attribute {
    pub const fn marker(name: &'static str, marker: TypeMarker) -> Self {
        Self {
            name,
            declaration: Declaration::Marker(marker),
        }
    }

    pub const fn text(name: &'static str) -> Self {
        Self::marker(name, TypeMarker::TEXT)
    }

    pub const fn integer(name: &'static str) -> Self {
        Self::marker(name, TypeMarker::INTEGER)
    }

    pub const fn real(name: &'static str) -> Self {
        Self::marker(name, TypeMarker::REAL)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::marker(name, TypeMarker::BOOLEAN)
    }

    pub const fn constant(name: &'static str) -> Self {
        Self {
            name,
            declaration: Declaration::Constant,
        }
    }

    pub const fn callable(name: &'static str) -> Self {
        Self {
            name,
            declaration: Declaration::Callable,
        }
    }

    pub const fn property(name: &'static str) -> Self {
        Self {
            name,
            declaration: Declaration::Property,
        }
    }

    pub fn is_private(&self) -> bool {
        self.name.starts_with(PRIVATE_PREFIX)
    }
}

/// Any type that declares attributes
///
/// This is the declaration surface callers honour. Only types that also
/// implement [`Model`] can be registered with a store.
pub trait Declared: 'static {
    /// Attributes in declaration order
    fn attributes() -> Vec<Attribute>;

    /// Short type name, without module path or generic arguments
    fn type_name() -> &'static str {
        short_type_name(std::any::type_name::<Self>())
    }
}

/// A record type that can be persisted by a store
///
/// Implementors keep an `Option<RowId>` for the id and expose their persisted
/// columns by name. Everything else on the type is left alone by the store.
pub trait Model: Declared + Send + Sync + Sized {
    /// Arguments taken by the record's own constructor
    type Args;

    /// Run the record's constructor
    ///
    /// Materializers call this on a cache miss and then overlay the persisted
    /// column values, so construction may set private state freely.
    fn construct(args: Self::Args) -> Self;

    /// Table the record type maps to
    fn table_name() -> String {
        Self::type_name().to_string()
    }

    fn id(&self) -> Option<RowId>;

    fn set_id(&mut self, id: Option<RowId>);

    /// Current value of a persisted column, `None` if the model has no such column
    fn column(&self, name: &str) -> Option<Value>;

    /// Overwrite a persisted column
    ///
    /// # Errors
    ///
    /// Returns `UnknownField` for a name the model does not persist and
    /// `TypeMismatch` when the value does not fit the column.
    fn set_column(&mut self, name: &str, value: Value) -> Result<(), MinidbError>;

    /// Column handle used to build predicates and aggregates
    fn c(name: &str) -> Column<Self> {
        Column::new(name)
    }
}

/// Runtime handle on a declared type
///
/// Used where the type is not known statically, e.g. when registering a
/// definition that may or may not be a model.
#[derive(Debug, Clone, Copy)]
pub struct RecordType {
    type_id: TypeId,
    type_name: &'static str,
    attributes: fn() -> Vec<Attribute>,
    table_name: Option<fn() -> String>,
}

impl RecordType {
    /// Handle on a model type
    pub fn of<T: Model>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: T::type_name(),
            attributes: T::attributes,
            table_name: Some(T::table_name),
        }
    }

    /// Handle on a declaration that is not (known to be) a model
    pub fn declared<T: Declared>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: T::type_name(),
            attributes: T::attributes,
            table_name: None,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn attributes(&self) -> Vec<Attribute> {
        (self.attributes)()
    }

    pub fn is_model(&self) -> bool {
        self.table_name.is_some()
    }

    /// Table name of a model type
    ///
    /// # Errors
    ///
    /// Returns `NotAModel` for a plain declaration.
    pub fn table_name(&self) -> Result<String, MinidbError> {
        self.table_name
            .map(|f| f())
            .ok_or_else(|| MinidbError::NotAModel {
                type_name: self.type_name.to_string(),
            })
    }
}

/// Strip module path and generic arguments from a Rust type name
pub fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Plain;

    impl Declared for Plain {
        fn attributes() -> Vec<Attribute> {
            vec![Attribute::text("column")]
        }
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("a::b::FieldTest"), "FieldTest");
        assert_eq!(short_type_name("FieldTest"), "FieldTest");
        assert_eq!(short_type_name("a::Wrapper<b::Inner>"), "Wrapper");
    }

    #[test]
    fn test_private_prefix() {
        assert!(Attribute::text("_secret").is_private());
        assert!(Attribute::constant("__class_attribute__").is_private());
        assert!(!Attribute::text("column1").is_private());
    }

    #[test]
    fn test_plain_declaration_is_not_a_model() {
        let rt = RecordType::declared::<Plain>();
        assert!(!rt.is_model());
        assert_eq!(rt.type_name(), "Plain");
        assert!(matches!(
            rt.table_name(),
            Err(MinidbError::NotAModel { .. })
        ));
    }

    #[test]
    fn test_marker_from_kind() {
        let marker: TypeMarker = FieldKind::Boolean.into();
        assert_eq!(marker, TypeMarker::BOOLEAN);
        assert_eq!(TypeMarker::named("list").kind(), None);
    }
}
