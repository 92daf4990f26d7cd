#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::FieldTest;
use minidb_core::introspect::classify;
use minidb_core::{
    describe, describe_type, Attribute, ColumnValue, Declaration, Declared, FieldKind, MdErrorKind,
    MinidbError, Model, RecordType, RowId, TypeMarker, Value,
};
use proptest::prelude::*;

/// Minimal model whose declarations are supplied per test type
macro_rules! declared_model {
    ($name:ident, [$($attr:expr),* $(,)?]) => {
        #[derive(Debug, Default)]
        struct $name {
            id: Option<RowId>,
        }

        impl Declared for $name {
            fn attributes() -> Vec<Attribute> {
                vec![$($attr),*]
            }
        }

        impl Model for $name {
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

            fn column(&self, _name: &str) -> Option<Value> {
                None
            }

            fn set_column(&mut self, name: &str, _value: Value) -> Result<(), MinidbError> {
                Err(MinidbError::UnknownField {
                    type_name: Self::type_name().to_string(),
                    field: name.to_string(),
                })
            }
        }
    };
}

declared_model!(BadMarker, [Attribute::text("ok"), Attribute::marker("blob", TypeMarker::named("bytes"))]);
declared_model!(Twice, [Attribute::integer("n"), Attribute::text("n")]);
declared_model!(ShadowsId, [Attribute::integer("id")]);
declared_model!(BadName, [Attribute::text("has space")]);
declared_model!(NoFields, [Attribute::constant("LIMIT"), Attribute::text("_hidden")]);

struct NotAModel;

impl Declared for NotAModel {
    fn attributes() -> Vec<Attribute> {
        vec![Attribute::text("column")]
    }
}

#[test]
fn test_persisted_fields_are_exactly_public_markers_in_order() {
    let meta = describe::<FieldTest>().unwrap();

    let names: Vec<&str> = meta.field_names().collect();
    assert_eq!(names, vec!["column1", "column2", "column3", "column4"]);

    let kinds: Vec<FieldKind> = meta.fields().iter().map(|f| f.kind).collect();
    assert_eq!(
        kinds,
        vec![
            FieldKind::Text,
            FieldKind::Integer,
            FieldKind::Real,
            FieldKind::Boolean
        ]
    );

    let ordinals: Vec<usize> = meta.fields().iter().map(|f| f.ordinal).collect();
    assert_eq!(ordinals, vec![0, 1, 2, 3]);
}

#[test]
fn test_private_and_non_marker_attributes_excluded() {
    let meta = describe::<FieldTest>().unwrap();

    for excluded in [
        "_private1",
        "_private2",
        "_private3",
        "_private4",
        "CONSTANT",
        "__class_attribute1__",
        "a_classmethod",
        "a_staticmethod",
        "a_membermethod",
        "a_read_only_property",
        "a_read_write_property",
    ] {
        assert!(meta.field(excluded).is_none(), "{excluded} must not persist");
    }
}

#[test]
fn test_table_defaults_to_type_name() {
    let meta = describe::<FieldTest>().unwrap();
    assert_eq!(meta.table(), "FieldTest");
    assert_eq!(meta.type_name(), "FieldTest");
}

#[test]
fn test_description_is_computed_once() {
    let first = describe::<FieldTest>().unwrap();
    let second = describe_type(&RecordType::of::<FieldTest>()).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn test_id_is_queryable_but_not_a_field() {
    let meta = describe::<FieldTest>().unwrap();
    assert!(meta.field("id").is_none());
    assert!(meta.has_column("id"));
    assert_eq!(meta.column_kind("id"), Some(FieldKind::Integer));

    let err = meta.require_column("column9").unwrap_err();
    assert!(matches!(err, MinidbError::UnknownField { .. }));
}

#[test]
fn test_unrecognized_marker_rejected() {
    let err = describe::<BadMarker>().unwrap_err();
    assert_eq!(err.kind(), MdErrorKind::InvalidFieldType);
    assert_eq!(err.field(), Some("blob"));
}

#[test]
fn test_unrecognized_private_marker_ignored() {
    // FieldTest declares _private1 with an "object" marker
    assert!(describe::<FieldTest>().is_ok());
}

#[test]
fn test_duplicate_field_rejected() {
    let err = describe::<Twice>().unwrap_err();
    assert_eq!(err.kind(), MdErrorKind::DuplicateField);
    assert_eq!(err.field(), Some("n"));
}

#[test]
fn test_field_named_id_rejected() {
    let err = describe::<ShadowsId>().unwrap_err();
    assert_eq!(err.kind(), MdErrorKind::DuplicateField);
}

#[test]
fn test_non_identifier_field_rejected() {
    let err = describe::<BadName>().unwrap_err();
    assert_eq!(err.kind(), MdErrorKind::InvalidIdentifier);
}

#[test]
fn test_failed_description_not_cached() {
    assert!(describe::<BadMarker>().is_err());
    assert!(describe::<BadMarker>().is_err());
}

#[test]
fn test_type_without_fields() {
    let meta = describe::<NoFields>().unwrap();
    assert!(meta.fields().is_empty());
}

#[test]
fn test_plain_declaration_is_not_a_model() {
    let record_type = RecordType::declared::<NotAModel>();
    assert!(!record_type.is_model());

    let err = describe_type(&record_type).unwrap_err();
    assert_eq!(err.kind(), MdErrorKind::NotAModel);
}

#[test]
fn test_column_values_round_trip_through_model() {
    let mut record = FieldTest::construct(7);
    record.set_column("column2", Value::Integer(42)).unwrap();
    record.set_column("column4", Value::Boolean(true)).unwrap();

    assert_eq!(record.column("column2"), Some(Value::Integer(42)));
    assert_eq!(record.column("column4"), Some(Value::Boolean(true)));
    assert_eq!(record.column("column1"), Some(Value::Null));
    assert_eq!(record.column("_private1"), None);
    assert_eq!(record.private1, 7);

    let err = record
        .set_column("column2", Value::Text("x".into()))
        .unwrap_err();
    assert!(matches!(err, MinidbError::TypeMismatch { .. }));
    assert_eq!(<Option<i64> as ColumnValue>::KIND, FieldKind::Integer);
}

const POOL: [Attribute; 12] = [
    Attribute::text("alpha"),
    Attribute::integer("beta"),
    Attribute::real("gamma"),
    Attribute::boolean("delta"),
    Attribute::text("_secret"),
    Attribute::marker("_handle", TypeMarker::named("object")),
    Attribute::constant("MAX"),
    Attribute::constant("__dunder__"),
    Attribute::callable("compute"),
    Attribute::callable("build"),
    Attribute::property("display"),
    Attribute::marker("epsilon", TypeMarker::named("str")),
];

proptest! {
    #[test]
    fn prop_classification_keeps_public_markers_in_order(
        attrs in prop::sample::subsequence(POOL.to_vec(), 0..=POOL.len()).prop_shuffle()
    ) {
        let fields = classify("Generated", &attrs).unwrap();

        let expected: Vec<&str> = attrs
            .iter()
            .filter(|a| !a.is_private())
            .filter(|a| matches!(a.declaration, Declaration::Marker(_)))
            .map(|a| a.name)
            .collect();
        let actual: Vec<&str> = fields.iter().map(|f| f.name).collect();

        prop_assert_eq!(actual, expected);
        for (i, field) in fields.iter().enumerate() {
            prop_assert_eq!(field.ordinal, i);
        }
    }
}
