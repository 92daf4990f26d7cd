use minidb_core::{
    Attribute, ColumnValue, Declared, MinidbError, Model, RowId, TypeMarker, Value,
};

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
    pub private3: i64,
    pub private4: Option<String>,
}

#[allow(dead_code)]
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
            private3: Self::CONSTANT,
            private4: None,
        }
    }

    pub fn a_membermethod(&self) -> i64 {
        self.private1
    }

    pub fn a_read_only_property(&self) -> String {
        self.private2.to_uppercase()
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
            Attribute::integer("_private3"),
            Attribute::marker("_private4", TypeMarker::named("object")),
            Attribute::constant("__class_attribute1__"),
            Attribute::constant("__class_attribute2__"),
            Attribute::callable("a_classmethod"),
            Attribute::callable("a_staticmethod"),
            Attribute::callable("a_membermethod"),
            Attribute::property("a_read_only_property"),
            Attribute::property("a_read_write_property"),
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
            _ => {
                return Err(MinidbError::UnknownField {
                    type_name: Self::type_name().to_string(),
                    field: name.to_string(),
                })
            }
        }
        Ok(())
    }
}
