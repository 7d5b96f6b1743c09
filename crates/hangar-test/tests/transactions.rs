//! Transactions and shared handles across threads.

use std::panic::{self, AssertUnwindSafe};

use hangar_db::{params, Database, DatabaseError, StatementResult};
use hangar_test::utils::{account, accounts_db, all_rows, ids, insert_account, text};
use hangar_test::workload::concurrent_inserts;

#[test]
fn test_rollback_restores_rows_and_counters() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");

    db.execute("BEGIN TRANSACTION").unwrap();
    insert_account(&db, "B", "b@x.com");
    db.prepare("UPDATE accounts SET status = ? WHERE id = ?")
        .run(&params!["APPROVED", 1])
        .unwrap();
    db.prepare("DELETE FROM accounts WHERE id = ?")
        .run(&params![1])
        .unwrap();
    db.execute("CREATE TABLE drones (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
    assert_eq!(db.execute("ROLLBACK").unwrap(), StatementResult::transaction("ROLLBACK"));

    assert_eq!(ids(&all_rows(&db, "accounts")), vec![1]);
    assert_eq!(account(&db, 1).unwrap().get("status"), None);
    assert_eq!(db.relation_names(), vec!["accounts"]);
    assert_eq!(insert_account(&db, "C", "c@x.com"), 2);
}

#[test]
fn test_commit_keeps_changes() {
    let db = accounts_db();

    db.execute("BEGIN").unwrap();
    insert_account(&db, "A", "a@x.com");
    db.execute("COMMIT").unwrap();

    assert!(!db.in_transaction());
    assert_eq!(ids(&all_rows(&db, "accounts")), vec![1]);
}

#[test]
fn test_transaction_misuse_is_an_error() {
    let db = accounts_db();

    assert!(matches!(db.execute("COMMIT"), Err(DatabaseError::Transaction(_))));
    assert!(matches!(db.execute("ROLLBACK"), Err(DatabaseError::Transaction(_))));

    db.execute("BEGIN").unwrap();
    assert!(matches!(db.execute("BEGIN"), Err(DatabaseError::Transaction(_))));
    db.execute("END").unwrap();
    assert!(!db.in_transaction());
}

#[test]
fn test_closure_transaction_rolls_back_on_error() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    let insert = db.prepare("INSERT INTO accounts (name, email) VALUES (?, ?)");

    let result: Result<(), DatabaseError> = db.transaction(|tx| {
        tx.run(&insert, &params!["B", "b@x.com"])?;
        tx.execute("CREATE TABLE payments (id INTEGER PRIMARY KEY)")?;
        Err(DatabaseError::Transaction("payment declined".to_string()))
    });

    assert_eq!(
        result,
        Err(DatabaseError::Transaction("payment declined".to_string()))
    );
    assert_eq!(ids(&all_rows(&db, "accounts")), vec![1]);
    assert_eq!(db.relation_names(), vec!["accounts"]);
    assert_eq!(insert_account(&db, "C", "c@x.com"), 2);
}

#[test]
fn test_closure_transaction_rolls_back_on_panic() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    let insert = db.prepare("INSERT INTO accounts (name, email) VALUES (?, ?)");

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        db.transaction(|tx| -> Result<(), DatabaseError> {
            tx.run(&insert, &params!["B", "b@x.com"])?;
            tx.execute("CREATE TABLE payments (id INTEGER PRIMARY KEY)")?;
            panic!("card processor unreachable");
        })
    }));

    assert!(outcome.is_err());
    assert_eq!(ids(&all_rows(&db, "accounts")), vec![1]);
    assert_eq!(db.relation_names(), vec!["accounts"]);
    assert_eq!(insert_account(&db, "C", "c@x.com"), 2);
}

#[test]
fn test_closure_transaction_commits_on_ok() {
    let db = accounts_db();
    let insert = db.prepare("INSERT INTO accounts (name, email) VALUES (?, ?)");
    let approve = db.prepare("UPDATE accounts SET status = ? WHERE id = ?");

    let id = db
        .transaction(|tx| {
            let id = tx.run(&insert, &params!["A", "a@x.com"])?.last_insert_id;
            tx.run(&approve, &params!["APPROVED", id])?;
            Ok(id)
        })
        .unwrap();

    assert_eq!(id, Some(1));
    assert_eq!(account(&db, 1).unwrap().get("status"), Some(&text("APPROVED")));
}

#[test]
fn test_concurrent_inserts_get_distinct_gap_free_ids() {
    let db = Database::in_memory();
    db.execute("CREATE TABLE telemetry (id INTEGER PRIMARY KEY, worker INTEGER, seq INTEGER)")
        .unwrap();

    let workload = concurrent_inserts(&db, "telemetry", 8, 50).unwrap();

    assert_eq!(workload.sorted_ids(), (1..=400).collect::<Vec<i64>>());
    for ids in &workload.ids_per_thread {
        assert_eq!(ids.len(), 50);
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
    assert_eq!(db.stats().total_rows, 400);
}

#[test]
fn test_clones_see_each_others_writes() {
    let db = accounts_db();
    let other = db.clone();

    let handle = std::thread::spawn(move || insert_account(&other, "A", "a@x.com"));
    let id = handle.join().unwrap();

    assert_eq!(account(&db, id).unwrap().get("email"), Some(&text("a@x.com")));
}
