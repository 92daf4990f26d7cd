//! Field introspection
//!
//! Turns a record type's declared attributes into the ordered column list the
//! store persists. Results are computed once per type and shared for the
//! lifetime of the process.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use crate::errors::{MinidbError, Result};
use crate::model::{Attribute, Declaration, FieldKind, Model, RecordType, ID_COLUMN};

/// Metadata for one persisted column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Position among the persisted fields, starting at 0
    pub ordinal: usize,
}

/// Persistence metadata of a record type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordMeta {
    type_id: TypeId,
    type_name: &'static str,
    table: String,
    fields: Vec<FieldDescriptor>,
}

impl RecordMeta {
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Persisted fields in declaration order, excluding `id`
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Whether `name` can appear in a query: `id` or a persisted field
    pub fn has_column(&self, name: &str) -> bool {
        name == ID_COLUMN || self.field(name).is_some()
    }

    /// Kind of a queryable column; `id` is an integer
    pub fn column_kind(&self, name: &str) -> Option<FieldKind> {
        if name == ID_COLUMN {
            return Some(FieldKind::Integer);
        }
        self.field(name).map(|f| f.kind)
    }

    /// # Errors
    ///
    /// Returns `UnknownField` when `name` is neither `id` nor a persisted field.
    pub fn require_column(&self, name: &str) -> std::result::Result<(), MinidbError> {
        if self.has_column(name) {
            Ok(())
        } else {
            Err(MinidbError::UnknownField {
                type_name: self.type_name.to_string(),
                field: name.to_string(),
            })
        }
    }
}

type DescriptionCache = RwLock<HashMap<TypeId, Arc<RecordMeta>>>;

static DESCRIPTIONS: OnceLock<DescriptionCache> = OnceLock::new();

fn cache() -> &'static DescriptionCache {
    DESCRIPTIONS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Describe a model type
///
/// # Errors
///
/// See [`describe_type`].
pub fn describe<T: Model>() -> Result<Arc<RecordMeta>> {
    describe_type(&RecordType::of::<T>())
}

/// Describe a record type, introspecting it on first use
///
/// # Errors
///
/// - `NotAModel` when the handle is a plain declaration
/// - `InvalidFieldType` when a public attribute carries an unrecognized marker
/// - `DuplicateField` when a persisted name repeats or is `id`
/// - `InvalidIdentifier` when the table or a field name is not a plain identifier
pub fn describe_type(record_type: &RecordType) -> Result<Arc<RecordMeta>> {
    if let Some(meta) = cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&record_type.type_id())
    {
        return Ok(Arc::clone(meta));
    }

    let meta = Arc::new(introspect(record_type)?);
    tracing::debug!(
        table = meta.table(),
        field_count = meta.fields().len(),
        "introspected record type {}",
        meta.type_name()
    );

    let mut guard = cache().write().unwrap_or_else(PoisonError::into_inner);
    let entry = guard
        .entry(record_type.type_id())
        .or_insert_with(|| Arc::clone(&meta));
    Ok(Arc::clone(entry))
}

fn introspect(record_type: &RecordType) -> std::result::Result<RecordMeta, MinidbError> {
    let type_name = record_type.type_name();
    let table = record_type.table_name()?;
    validate_identifier(&table)?;
    let fields = classify(type_name, &record_type.attributes())?;

    Ok(RecordMeta {
        type_id: record_type.type_id(),
        type_name,
        table,
        fields,
    })
}

/// Pick the persisted fields out of a declaration list, in order
///
/// Private names, constants, callables and properties are skipped; every
/// other attribute must carry one of the four recognized markers.
///
/// # Errors
///
/// - `InvalidFieldType` for a public marker that names no persisted kind
/// - `DuplicateField` when a persisted name repeats or is `id`
/// - `InvalidIdentifier` when a persisted name is not a plain identifier
pub fn classify(
    type_name: &str,
    attributes: &[Attribute],
) -> std::result::Result<Vec<FieldDescriptor>, MinidbError> {
    let mut fields = Vec::new();
    let mut seen = HashSet::new();

    for attribute in attributes {
        if attribute.is_private() {
            continue;
        }
        let marker = match attribute.declaration {
            Declaration::Marker(marker) => marker,
            Declaration::Constant | Declaration::Callable | Declaration::Property => continue,
        };
        let kind = marker.kind().ok_or_else(|| MinidbError::InvalidFieldType {
            type_name: type_name.to_string(),
            field: attribute.name.to_string(),
            marker: marker.name().to_string(),
        })?;
        if attribute.name == ID_COLUMN || !seen.insert(attribute.name) {
            return Err(MinidbError::DuplicateField {
                type_name: type_name.to_string(),
                field: attribute.name.to_string(),
            });
        }
        validate_identifier(attribute.name)?;

        fields.push(FieldDescriptor {
            name: attribute.name,
            kind,
            ordinal: fields.len(),
        });
    }

    Ok(fields)
}

/// Check that `name` is a plain SQL identifier: `[A-Za-z_][A-Za-z0-9_]*`
///
/// # Errors
///
/// Returns `InvalidIdentifier` otherwise.
pub fn validate_identifier(name: &str) -> std::result::Result<(), MinidbError> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(MinidbError::InvalidIdentifier {
            name: name.to_string(),
        })
    }
}
