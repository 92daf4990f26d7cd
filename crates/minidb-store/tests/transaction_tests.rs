#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{seed_counters, setup_store, Counter};
use minidb_core::{Instance, MdError, MdErrorKind, MinidbError, Model};
use minidb_store::{ModelStoreExt, Store};

fn counter(n: i64) -> Instance<Counter> {
    Instance::new(Counter::with_n(n))
}

fn aborted() -> MdError {
    MinidbError::NotPersisted {
        type_name: "Abort".to_string(),
    }
    .into()
}

#[test]
fn test_commit_keeps_rows_and_ids() {
    let store = setup_store();
    let first = counter(1);
    let second = counter(2);

    store
        .transaction(|tx| {
            tx.save(&first)?;
            tx.save(&second)?;
            Ok(())
        })
        .unwrap();

    assert!(first.id().is_some());
    assert!(second.id().is_some());
    assert_eq!(store.count::<Counter>(None).unwrap(), 2);
    assert!(!store.in_transaction());
}

#[test]
fn test_transaction_returns_closure_value() {
    let store = setup_store();

    let id = store.transaction(|tx| tx.save(&counter(3))).unwrap();

    let found = Counter::get(&store, [("id", id)]).unwrap().call(()).unwrap();
    assert_eq!(found.unwrap().read().n, Some(3));
}

#[test]
fn test_rollback_discards_rows_and_clears_assigned_ids() {
    let store = setup_store();
    seed_counters(&store, [1]);
    let inserted = counter(2);

    let err = store
        .transaction(|tx| {
            tx.save(&inserted)?;
            assert!(inserted.id().is_some());
            Err::<(), _>(aborted())
        })
        .unwrap_err();

    assert_eq!(err.kind(), MdErrorKind::NotPersisted);
    assert_eq!(inserted.id(), None);
    assert_eq!(store.count::<Counter>(None).unwrap(), 1);
    assert!(!store.in_transaction());
}

#[test]
fn test_rollback_restores_deleted_ids() {
    let store = setup_store();
    let kept = counter(7);
    let id = store.save(&kept).unwrap();

    store
        .transaction(|tx| {
            tx.delete(&kept)?;
            assert_eq!(kept.id(), None);
            Err::<(), _>(aborted())
        })
        .unwrap_err();

    assert_eq!(kept.id(), Some(id));
    let found = Counter::get(&store, [("id", id)])
        .unwrap()
        .call(())
        .unwrap()
        .unwrap();
    assert!(found.ptr_eq(&kept));
}

#[test]
fn test_rollback_undoes_delete_where() {
    let store = setup_store();
    let live = counter(5);
    store.save(&live).unwrap();
    let id = live.id();

    store
        .transaction(|tx| {
            assert_eq!(tx.delete_where(Counter::c("n").eq(5))?, 1);
            assert_eq!(live.id(), None);
            Err::<(), _>(aborted())
        })
        .unwrap_err();

    assert_eq!(live.id(), id);
    assert_eq!(store.count::<Counter>(None).unwrap(), 1);
}

#[test]
fn test_update_inside_rollback_keeps_field_values() {
    let store = setup_store();
    let record = counter(1);
    store.save(&record).unwrap();

    store
        .transaction(|tx| {
            record.write().n = Some(2);
            tx.save(&record)?;
            Err::<(), _>(aborted())
        })
        .unwrap_err();

    // The row is back to 1, the instance keeps what it was given
    assert_eq!(record.read().n, Some(2));
    assert_eq!(store.count::<Counter>(Some(Counter::c("n").eq(1))).unwrap(), 1);
}

#[test]
fn test_registration_inside_rollback_is_undone() {
    let store = setup_store();

    store
        .transaction(|tx| {
            tx.save(&counter(1))?;
            assert!(tx.is_registered::<Counter>());
            Err::<(), _>(aborted())
        })
        .unwrap_err();

    assert!(!store.is_registered::<Counter>());
    assert!(store.tables().unwrap().is_empty());

    store.save(&counter(2)).unwrap();
    assert_eq!(store.count::<Counter>(None).unwrap(), 1);
}

#[test]
fn test_nested_transaction_fails() {
    let store = setup_store();

    let err = store
        .transaction(|tx| tx.transaction(|_| Ok(())))
        .unwrap_err();

    assert_eq!(err.kind(), MdErrorKind::TransactionActive);
    assert!(!store.in_transaction());
}

#[test]
fn test_in_transaction_reflects_scope() {
    let store = setup_store();
    assert!(!store.in_transaction());

    let inside = store.transaction(|tx| Ok(tx.in_transaction())).unwrap();

    assert!(inside);
    assert!(!store.in_transaction());
}

#[test]
fn test_close_inside_transaction() {
    let store = setup_store();
    let record = counter(1);

    let err = store
        .transaction(|tx: &Store| {
            tx.save(&record)?;
            tx.close()
        })
        .unwrap_err();

    assert_eq!(err.kind(), MdErrorKind::StoreClosed);
    assert_eq!(record.id(), None);
    assert!(!store.is_open());
}

#[test]
fn test_panicking_closure_rolls_back() {
    let store = setup_store();
    seed_counters(&store, [1]);
    let inserted = counter(2);

    let unwound = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        store.transaction(|tx| -> minidb_store::Result<()> {
            tx.save(&inserted)?;
            panic!("closure failed midway");
        })
    }));

    assert!(unwound.is_err());
    assert!(!store.in_transaction());
    assert_eq!(inserted.id(), None);
    assert_eq!(store.count::<Counter>(None).unwrap(), 1);

    // The store is usable afterwards
    store.transaction(|tx| tx.save(&counter(3))).unwrap();
    assert_eq!(store.count::<Counter>(None).unwrap(), 2);
}
