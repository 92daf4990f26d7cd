#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{seed_counters, setup_store, Counter, FieldTest};
use minidb_core::{Instance, MdErrorKind, Value};
use minidb_store::{ColumnInfo, TableInfo};

fn column(name: &str, declared_type: &str) -> ColumnInfo {
    ColumnInfo {
        name: name.to_string(),
        declared_type: declared_type.to_string(),
    }
}

#[test]
fn test_tables_lists_registered_tables_sorted() {
    let store = setup_store();
    store.register::<FieldTest>().unwrap();
    store.register::<Counter>().unwrap();

    let tables = store.tables().unwrap();

    assert_eq!(
        tables,
        vec![
            TableInfo {
                name: "Counter".to_string(),
                columns: vec![column("id", "INTEGER"), column("n", "INTEGER")],
            },
            TableInfo {
                name: "FieldTest".to_string(),
                columns: vec![
                    column("id", "INTEGER"),
                    column("column1", "TEXT"),
                    column("column2", "INTEGER"),
                    column("column3", "REAL"),
                    column("column4", "BOOLEAN"),
                ],
            },
        ]
    );
}

#[test]
fn test_tables_serialize_to_json() {
    let store = setup_store();
    store.register::<Counter>().unwrap();

    let json = serde_json::to_value(store.tables().unwrap()).unwrap();

    assert_eq!(json[0]["name"], "Counter");
    assert_eq!(json[0]["columns"][1]["declared_type"], "INTEGER");
}

#[test]
fn test_count_rows() {
    let store = setup_store();
    seed_counters(&store, 0..12);

    assert_eq!(store.count_rows("Counter").unwrap(), 12);
}

#[test]
fn test_dump_decodes_by_declared_type() {
    let store = setup_store();
    let record = Instance::<FieldTest>::construct(0);
    record
        .assign([
            ("column1", Value::from("text")),
            ("column3", Value::from(1.5)),
            ("column4", Value::from(false)),
        ])
        .unwrap();
    store.save(&record).unwrap();

    let rows: Vec<_> = store.dump("FieldTest", None).unwrap().collect();

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id(), record.id());
    assert_eq!(rows[0].get("column1"), Some(&Value::from("text")));
    assert_eq!(rows[0].get("column2"), Some(&Value::Null));
    assert_eq!(rows[0].get("column3"), Some(&Value::Real(1.5)));
    assert_eq!(rows[0].get("column4"), Some(&Value::Boolean(false)));
}

#[test]
fn test_dump_with_limit() {
    let store = setup_store();
    seed_counters(&store, 0..10);

    assert_eq!(store.dump("Counter", Some(3)).unwrap().len(), 3);
    assert_eq!(store.dump("Counter", Some(0)).unwrap().len(), 0);
}

#[test]
fn test_unknown_table_is_not_found() {
    let store = setup_store();

    assert_eq!(
        store.count_rows("Nope").unwrap_err().kind(),
        MdErrorKind::NotFound
    );
    assert_eq!(
        store.dump("Nope", None).map(|_| ()).unwrap_err().kind(),
        MdErrorKind::NotFound
    );
}

#[test]
fn test_hostile_table_name_is_quoted() {
    let store = setup_store();
    seed_counters(&store, [1]);

    let err = store.count_rows("Counter\"; DROP TABLE \"Counter").unwrap_err();

    assert_eq!(err.kind(), MdErrorKind::NotFound);
    assert_eq!(store.count_rows("Counter").unwrap(), 1);
}
