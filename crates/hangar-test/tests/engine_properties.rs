//! Behavior of the statement engine through prepared handles.

use hangar_db::{params, DatabaseConfig, RunResult, UpdateChanges, Value};
use hangar_test::utils::{account, accounts_db, accounts_db_with, all_rows, ids, insert_account, text};
use proptest::prelude::*;

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_insert_then_fetch_by_email() {
    let db = accounts_db();
    let id = insert_account(&db, "A", "a@x.com");
    assert_eq!(id, 1);

    let row = db
        .prepare("SELECT * FROM accounts WHERE email = ?")
        .fetch_one(&params!["a@x.com"])
        .unwrap()
        .unwrap();
    assert_eq!(row.id(), Some(1));
    assert_eq!(row.get("name"), Some(&text("A")));
}

#[test]
fn test_delete_leaves_remaining_rows() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    assert_eq!(insert_account(&db, "B", "b@x.com"), 2);

    let deleted = db
        .prepare("DELETE FROM accounts WHERE id = ?")
        .run(&params![1])
        .unwrap();
    assert_eq!(deleted.changes, 1);

    assert_eq!(ids(&all_rows(&db, "accounts")), vec![2]);
}

#[test]
fn test_update_status_keeps_other_fields() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    insert_account(&db, "B", "b@x.com");
    let before = account(&db, 2).unwrap();

    db.prepare("UPDATE accounts SET status = ? WHERE id = ?")
        .run(&params!["APPROVED", 2])
        .unwrap();

    let after = account(&db, 2).unwrap();
    assert_eq!(after.get("status"), Some(&text("APPROVED")));
    for (column, value) in before.iter() {
        assert_eq!(after.get(column), Some(value), "column {} changed", column);
    }
    assert_eq!(account(&db, 1).unwrap().get("status"), None);
}

#[test]
fn test_unknown_relation_is_neutral() {
    let db = accounts_db();

    let row = db
        .prepare("SELECT * FROM hangars WHERE id = ?")
        .fetch_one(&params![1])
        .unwrap();
    assert!(row.is_none());

    let result = db
        .prepare("INSERT INTO hangars (name) VALUES (?)")
        .run(&params!["north"])
        .unwrap();
    assert_eq!(result, RunResult { changes: 0, last_insert_id: None });
    assert!(!db.relation_names().contains(&"hangars".to_string()));
}

// =============================================================================
// Deletes and updates
// =============================================================================

#[test]
fn test_delete_missing_id_changes_nothing() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    let before = all_rows(&db, "accounts");

    let result = db
        .prepare("DELETE FROM accounts WHERE id = ?")
        .run(&params![42])
        .unwrap();

    assert_eq!(result.changes, 0);
    assert_eq!(all_rows(&db, "accounts"), before);
}

#[test]
fn test_update_missing_id_reports_one_change() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    let before = all_rows(&db, "accounts");

    let result = db
        .prepare("UPDATE accounts SET status = ? WHERE id = ?")
        .run(&params!["APPROVED", 99])
        .unwrap();

    // Current behavior: the count does not reflect matches.
    assert_eq!(result.changes, 1);
    assert_eq!(all_rows(&db, "accounts"), before);
}

#[test]
fn test_update_missing_id_expected_after_fix() {
    let config = DatabaseConfig::builder()
        .update_changes(UpdateChanges::Matched)
        .build();
    let db = accounts_db_with(config);
    insert_account(&db, "A", "a@x.com");

    let update = db.prepare("UPDATE accounts SET status = ? WHERE id = ?");
    assert_eq!(update.run(&params!["APPROVED", 99]).unwrap().changes, 0);
    assert_eq!(update.run(&params!["APPROVED", 1]).unwrap().changes, 1);
}

#[test]
fn test_update_cannot_reassign_id() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    insert_account(&db, "B", "b@x.com");

    db.prepare("UPDATE accounts SET id = ? WHERE id = ?")
        .run(&params![1, 2])
        .unwrap();
    db.prepare("UPDATE accounts SET id = ?, name = ? WHERE id = ?")
        .run(&params!["x", "Z", 1])
        .unwrap();

    let rows = all_rows(&db, "accounts");
    assert_eq!(ids(&rows), vec![1, 2]);
    assert!(rows.iter().all(|row| row.id().is_some()));
    assert_eq!(account(&db, 1).unwrap().get("name"), Some(&text("Z")));
    assert_eq!(insert_account(&db, "C", "c@x.com"), 3);
}

#[test]
fn test_deleted_id_is_not_reused() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    insert_account(&db, "B", "b@x.com");
    db.prepare("DELETE FROM accounts WHERE id = ?")
        .run(&params![2])
        .unwrap();

    assert_eq!(insert_account(&db, "C", "c@x.com"), 3);
}

// =============================================================================
// Creation
// =============================================================================

#[test]
fn test_create_is_idempotent() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    insert_account(&db, "B", "b@x.com");
    let before = all_rows(&db, "accounts");

    db.execute(hangar_test::utils::ACCOUNTS).unwrap();
    db.execute("CREATE TABLE accounts (id INTEGER PRIMARY KEY)").unwrap();

    assert_eq!(all_rows(&db, "accounts"), before);
    assert_eq!(insert_account(&db, "C", "c@x.com"), 3);
}

// =============================================================================
// Fetch paths
// =============================================================================

#[test]
fn test_fetch_many_unrecognized_where_returns_all_rows() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    insert_account(&db, "B", "b@x.com");

    let rows = db
        .prepare("SELECT * FROM accounts WHERE name != ?")
        .fetch_many(&params!["A"])
        .unwrap();
    assert_eq!(ids(&rows), vec![1, 2]);
}

#[test]
fn test_fetch_one_unrecognized_where_returns_none() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");

    let row = db
        .prepare("SELECT * FROM accounts WHERE name = ?")
        .fetch_one(&params!["A"])
        .unwrap();
    assert!(row.is_none());
}

#[test]
fn test_fetch_one_without_where_returns_first_row() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");
    insert_account(&db, "B", "b@x.com");

    let row = db.prepare("SELECT * FROM accounts").fetch_one(&[]).unwrap().unwrap();
    assert_eq!(row.id(), Some(1));
}

#[test]
fn test_fetch_many_recognized_conjuncts() {
    let db = accounts_db();
    let insert = db.prepare("INSERT INTO accounts (name, email, status) VALUES (?, ?, ?)");
    insert.run(&params!["A", "a@x.com", "ACTIVE"]).unwrap();
    insert.run(&params!["B", "b@x.com", "BLOCKED"]).unwrap();
    insert.run(&params!["C", "c@x.com", "ACTIVE"]).unwrap();

    let active = db
        .prepare("SELECT * FROM accounts WHERE status = ? ORDER BY id DESC LIMIT 1")
        .fetch_many(&params!["ACTIVE"])
        .unwrap();
    assert_eq!(ids(&active), vec![1, 3]);

    let both = db
        .prepare("SELECT * FROM accounts WHERE status = ? AND email = ?")
        .fetch_many(&params!["ACTIVE", "c@x.com"])
        .unwrap();
    assert_eq!(ids(&both), vec![3]);
}

#[test]
fn test_fetch_projection() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");

    let row = db
        .prepare("SELECT id, email FROM accounts WHERE id = ?")
        .fetch_one(&params![1])
        .unwrap()
        .unwrap();
    assert_eq!(row.columns().collect::<Vec<_>>(), vec!["id", "email"]);
}

#[test]
fn test_numeric_equality_coerces() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");

    assert!(account(&db, 1).is_some());
    let by_real = db
        .prepare("SELECT * FROM accounts WHERE id = ?")
        .fetch_one(&[Value::Real(1.0)])
        .unwrap();
    assert!(by_real.is_some());

    let by_text = db
        .prepare("SELECT * FROM accounts WHERE id = ?")
        .fetch_one(&params!["1"])
        .unwrap();
    assert!(by_text.is_none());
}

#[test]
fn test_rows_serialize_in_column_order() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");

    let json = serde_json::to_string(&account(&db, 1).unwrap()).unwrap();
    assert_eq!(json, r#"{"id":1,"name":"A","email":"a@x.com"}"#);
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_identities_follow_call_order(names in prop::collection::vec("[a-z]{1,8}", 1..40)) {
        let db = accounts_db();
        let insert = db.prepare("INSERT INTO accounts (name) VALUES (?)");

        let assigned: Vec<i64> = names
            .iter()
            .map(|name| insert.run(&params![name.as_str()]).unwrap().last_insert_id.unwrap())
            .collect();

        let expected: Vec<i64> = (1..=names.len() as i64).collect();
        prop_assert_eq!(&assigned, &expected);
        prop_assert_eq!(ids(&all_rows(&db, "accounts")), expected);
    }

    #[test]
    fn test_delete_then_fetch_returns_none(count in 1usize..20, pick in any::<prop::sample::Index>()) {
        let db = accounts_db();
        for i in 0..count {
            insert_account(&db, "n", &format!("{}@x.com", i));
        }
        let victim = pick.index(count) as i64 + 1;

        let result = db
            .prepare("DELETE FROM accounts WHERE id = ?")
            .run(&params![victim])
            .unwrap();
        prop_assert_eq!(result.changes, 1);
        prop_assert!(account(&db, victim).is_none());
        prop_assert_eq!(all_rows(&db, "accounts").len(), count - 1);
    }
}
