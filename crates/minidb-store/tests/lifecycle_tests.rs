#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{seed_counters, setup_store, Counter};
use minidb_core::{Instance, MdErrorKind, Model, Select};
use minidb_store::{Store, StoreConfig};
use tempfile::tempdir;

#[test]
fn test_operations_on_closed_store_fail() {
    let store = setup_store();
    seed_counters(&store, [1]);
    store.close().unwrap();

    assert!(!store.is_open());
    let kinds = [
        store.save(&Instance::new(Counter::default())).unwrap_err().kind(),
        store.load::<Counter>().map(|_| ()).unwrap_err().kind(),
        store.count::<Counter>(None).unwrap_err().kind(),
        store.register::<Counter>().unwrap_err().kind(),
        store.tables().unwrap_err().kind(),
        store.transaction(|_| Ok(())).unwrap_err().kind(),
        Select::<Counter>::records().query(&store).unwrap_err().kind(),
    ];
    assert!(kinds.iter().all(|k| *k == MdErrorKind::StoreClosed), "{:?}", kinds);
}

#[test]
fn test_delete_on_closed_store_reports_closed_first() {
    let store = setup_store();
    store.close().unwrap();

    let err = store
        .delete(&Instance::new(Counter::default()))
        .unwrap_err();

    assert_eq!(err.kind(), MdErrorKind::StoreClosed);
}

#[test]
fn test_close_is_idempotent() {
    let store = setup_store();

    store.close().unwrap();
    store.close().unwrap();

    assert!(!store.is_open());
}

#[test]
fn test_close_drops_registration() {
    let store = setup_store();
    store.register::<Counter>().unwrap();

    store.close().unwrap();

    assert!(!store.is_registered::<Counter>());
}

#[test]
fn test_file_database_persists_across_stores() {
    let dir = tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("app.db")).with_autoregister(true);

    {
        let store = Store::open(config.clone()).unwrap();
        seed_counters(&store, 0..5);
    }

    let store = Store::open(config).unwrap();
    assert_eq!(store.count::<Counter>(None).unwrap(), 5);
    let loaded: Vec<_> = store
        .load::<Counter>()
        .unwrap()
        .call(())
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(loaded.len(), 5);
}

#[test]
fn test_reopened_store_requires_registration_again() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.db");

    {
        let store = Store::open(StoreConfig::file(&path).with_autoregister(true)).unwrap();
        seed_counters(&store, [1]);
    }

    let strict = Store::open(StoreConfig::file(&path)).unwrap();
    let err = strict.count::<Counter>(None).unwrap_err();
    assert_eq!(err.kind(), MdErrorKind::UnknownClass);

    // The table already exists; registering adopts it
    strict.register::<Counter>().unwrap();
    assert_eq!(strict.count::<Counter>(None).unwrap(), 1);
}

#[test]
fn test_scoped_store_closes_and_returns_value() {
    let dir = tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("scoped.db")).with_autoregister(true);

    let id = Store::scoped(config.clone(), |store| {
        store.save(&Instance::new(Counter::with_n(42)))
    })
    .unwrap();

    let total = Store::scoped(config, |store| {
        let found = store.get::<Counter, _, _, _>([("id", id)])?.call(())?;
        Ok(found.and_then(|counter| {
            let record = counter.read();
            record.n
        }))
    })
    .unwrap();
    assert_eq!(total, Some(42));
}

#[test]
fn test_scoped_error_is_returned() {
    let err = Store::scoped(StoreConfig::in_memory(), |store| {
        store.save(&Instance::new(Counter::default()))
    })
    .unwrap_err();

    assert_eq!(err.kind(), MdErrorKind::UnknownClass);
}

#[test]
fn test_vacuum_on_close() {
    let dir = tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("vacuum.db"))
        .with_autoregister(true)
        .with_vacuum_on_close(true);

    let store = Store::open(config.clone()).unwrap();
    seed_counters(&store, 0..50);
    store.delete_where(Counter::c("n").lt(40)).unwrap();
    store.close().unwrap();

    let store = Store::open(config).unwrap();
    assert_eq!(store.count_rows("Counter").unwrap(), 10);
}

#[test]
fn test_instances_outlive_closed_store() {
    let store = setup_store();
    let counter = Instance::new(Counter::with_n(3));
    let id = store.save(&counter).unwrap();

    store.close().unwrap();

    assert_eq!(counter.id(), Some(id));
    assert_eq!(counter.read().n, Some(3));
}

#[test]
fn test_unopenable_path_fails_backend() {
    let dir = tempdir().unwrap();
    let config = StoreConfig::file(dir.path().join("missing").join("app.db"));

    let err = Store::open(config).unwrap_err();

    assert_eq!(err.kind(), MdErrorKind::Backend);
}

#[test]
fn test_missing_file_not_created_without_create_if_missing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent.db");
    let config = StoreConfig::file(&path).with_create_if_missing(false);

    let err = Store::open(config).unwrap_err();

    assert_eq!(err.kind(), MdErrorKind::NotFound);
    assert!(!path.exists());
}

#[test]
fn test_existing_file_opens_without_create_if_missing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("app.db");
    Store::scoped(StoreConfig::file(&path).with_autoregister(true), |store| {
        seed_counters(store, [5]);
        Ok(())
    })
    .unwrap();

    let store = Store::open(
        StoreConfig::file(&path)
            .with_autoregister(true)
            .with_create_if_missing(false),
    )
    .unwrap();

    assert_eq!(store.count::<Counter>(None).unwrap(), 1);
}

#[test]
fn test_store_ids_are_distinct() {
    let first = Store::in_memory().unwrap();
    let second = Store::in_memory().unwrap();

    assert_ne!(first.id(), second.id());
    assert!(first.config().is_in_memory());
}
