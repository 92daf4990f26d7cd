#![allow(dead_code)]

use minidb_core::{
    Attribute, ColumnValue, Declared, MinidbError, Model, RowId, TypeMarker, Value,
};
use minidb_store::{Store, StoreConfig};

/// In-memory store that registers types on first use
pub fn setup_store() -> Store {
    Store::open(StoreConfig::in_memory().with_autoregister(true)).unwrap()
}

/// In-memory store that requires explicit registration
pub fn setup_strict_store() -> Store {
    Store::open(StoreConfig::in_memory()).unwrap()
}

fn unknown_field(type_name: &str, field: &str) -> MinidbError {
    MinidbError::UnknownField {
        type_name: type_name.to_string(),
        field: field.to_string(),
    }
}

/// Single integer column
#[derive(Debug, Default)]
pub struct Counter {
    id: Option<RowId>,
    pub n: Option<i64>,
}

impl Counter {
    pub fn with_n(n: i64) -> Self {
        Self {
            n: Some(n),
            ..Self::default()
        }
    }
}

impl Declared for Counter {
    fn attributes() -> Vec<Attribute> {
        vec![Attribute::integer("n")]
    }
}

impl Model for Counter {
    type Args = ();

    fn construct(_: ()) -> Self {
        Self::default()
    }

    fn id(&self) -> Option<RowId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RowId>) {
        self.id = id;
    }

    fn column(&self, name: &str) -> Option<Value> {
        match name {
            "n" => Some(self.n.to_value()),
            _ => None,
        }
    }

    fn set_column(&mut self, name: &str, value: Value) -> Result<(), MinidbError> {
        match name {
            "n" => self.n = ColumnValue::from_value(name, value)?,
            _ => return Err(unknown_field(Self::type_name(), name)),
        }
        Ok(())
    }
}

/// Record type exercising every kind of attribute a declaration can carry
#[derive(Debug)]
pub struct FieldTest {
    id: Option<RowId>,

    // Persisted
    pub column1: Option<String>,
    pub column2: Option<i64>,
    pub column3: Option<f64>,
    pub column4: Option<bool>,

    // Not persisted per-instance state
    pub private1: i64,
    pub private2: String,
}

impl FieldTest {
    pub const CONSTANT: i64 = 123;

    pub fn new(constructor_arg: i64) -> Self {
        Self {
            id: None,
            column1: None,
            column2: None,
            column3: None,
            column4: None,
            private1: constructor_arg,
            private2: "private".to_string(),
        }
    }
}

impl Declared for FieldTest {
    fn attributes() -> Vec<Attribute> {
        vec![
            Attribute::constant("CONSTANT"),
            Attribute::text("column1"),
            Attribute::integer("column2"),
            Attribute::real("column3"),
            Attribute::boolean("column4"),
            Attribute::marker("_private1", TypeMarker::named("object")),
            Attribute::text("_private2"),
            Attribute::constant("__class_attribute1__"),
            Attribute::callable("a_membermethod"),
            Attribute::property("a_read_only_property"),
        ]
    }
}

impl Model for FieldTest {
    type Args = i64;

    fn construct(constructor_arg: i64) -> Self {
        Self::new(constructor_arg)
    }

    fn id(&self) -> Option<RowId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RowId>) {
        self.id = id;
    }

    fn column(&self, name: &str) -> Option<Value> {
        match name {
            "column1" => Some(self.column1.to_value()),
            "column2" => Some(self.column2.to_value()),
            "column3" => Some(self.column3.to_value()),
            "column4" => Some(self.column4.to_value()),
            _ => None,
        }
    }

    fn set_column(&mut self, name: &str, value: Value) -> Result<(), MinidbError> {
        match name {
            "column1" => self.column1 = ColumnValue::from_value(name, value)?,
            "column2" => self.column2 = ColumnValue::from_value(name, value)?,
            "column3" => self.column3 = ColumnValue::from_value(name, value)?,
            "column4" => self.column4 = ColumnValue::from_value(name, value)?,
            _ => return Err(unknown_field(Self::type_name(), name)),
        }
        Ok(())
    }
}

/// Maps to the same table as [`Counter`]
#[derive(Debug, Default)]
pub struct CounterAlias {
    id: Option<RowId>,
}

impl Declared for CounterAlias {
    fn attributes() -> Vec<Attribute> {
        vec![Attribute::integer("n")]
    }
}

impl Model for CounterAlias {
    type Args = ();

    fn construct(_: ()) -> Self {
        Self::default()
    }

    fn table_name() -> String {
        "Counter".to_string()
    }

    fn id(&self) -> Option<RowId> {
        self.id
    }

    fn set_id(&mut self, id: Option<RowId>) {
        self.id = id;
    }

    fn column(&self, _name: &str) -> Option<Value> {
        Some(Value::Null)
    }

    fn set_column(&mut self, name: &str, _value: Value) -> Result<(), MinidbError> {
        Err(unknown_field(Self::type_name(), name))
    }
}

/// Declares fields but is not a model
pub struct PlainDeclaration;

impl Declared for PlainDeclaration {
    fn attributes() -> Vec<Attribute> {
        vec![Attribute::text("column")]
    }
}

/// Save one `Counter` per value
pub fn seed_counters(store: &Store, values: impl IntoIterator<Item = i64>) {
    for n in values {
        let counter = minidb_core::Instance::new(Counter::with_n(n));
        store.save(&counter).unwrap();
    }
}
