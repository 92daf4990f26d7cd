pub mod declare;
pub mod instance;
pub mod value;

pub use declare::{
    short_type_name, Attribute, Declaration, Declared, Model, RecordType, RowId, TypeMarker,
    ID_COLUMN, PRIVATE_PREFIX,
};
pub use instance::{Instance, WeakInstance};
pub use value::{ColumnValue, FieldKind, Value};
