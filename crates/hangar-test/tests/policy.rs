//! Unsupported-statement policy and uniqueness enforcement.

use hangar_db::{params, DatabaseConfig, DatabaseError, RunResult, StatementResult, UnsupportedPolicy};
use hangar_test::utils::{accounts_db, accounts_db_with, all_rows, ids, insert_account, platform_db};

fn rejecting() -> DatabaseConfig {
    DatabaseConfig::builder()
        .unsupported(UnsupportedPolicy::Reject)
        .build()
}

#[test]
fn test_degrade_returns_neutral_values() {
    let db = accounts_db();
    insert_account(&db, "A", "a@x.com");

    let update_by_email = db.prepare("UPDATE accounts SET status = ? WHERE email = ?");
    assert_eq!(
        update_by_email.run(&params!["APPROVED", "a@x.com"]).unwrap(),
        RunResult::default()
    );

    let count = db.prepare("SELECT COUNT(*) FROM accounts");
    assert_eq!(count.fetch_one(&[]).unwrap(), None);
    assert!(count.fetch_many(&[]).unwrap().is_empty());

    let join = db.prepare("SELECT * FROM accounts a JOIN drones d ON d.provider_id = a.id");
    assert!(join.fetch_many(&[]).unwrap().is_empty());

    assert!(matches!(
        db.execute("DROP TABLE accounts").unwrap(),
        StatementResult::Ignored { .. }
    ));
    assert_eq!(ids(&all_rows(&db, "accounts")), vec![1]);
}

#[test]
fn test_reject_surfaces_unsupported() {
    let db = accounts_db_with(rejecting());
    insert_account(&db, "A", "a@x.com");

    let delete_by_email = db.prepare("DELETE FROM accounts WHERE email = ?");
    let err = delete_by_email.run(&params!["a@x.com"]).unwrap_err();
    assert!(err.is_unsupported());

    let count = db.prepare("SELECT COUNT(*) FROM accounts");
    assert!(count.fetch_one(&[]).unwrap_err().is_unsupported());

    assert!(db.execute("DROP TABLE accounts").unwrap_err().is_unsupported());
    assert_eq!(ids(&all_rows(&db, "accounts")), vec![1]);
}

#[test]
fn test_reject_keeps_recognized_zero_match_results() {
    let db = accounts_db_with(rejecting());

    let missing = db
        .prepare("SELECT * FROM accounts WHERE id = ?")
        .fetch_one(&params![7])
        .unwrap();
    assert!(missing.is_none());

    let gone = db
        .prepare("SELECT * FROM nowhere WHERE id = ?")
        .fetch_many(&params![7])
        .unwrap();
    assert!(gone.is_empty());
}

#[test]
fn test_unique_email_not_enforced_by_default() {
    let db = accounts_db();
    insert_account(&db, "A", "dup@x.com");
    insert_account(&db, "B", "dup@x.com");

    assert_eq!(all_rows(&db, "accounts").len(), 2);
}

#[test]
fn test_unique_email_enforced_when_enabled() {
    let db = platform_db(DatabaseConfig::builder().enforce_unique(true).build());
    let insert = db.prepare("INSERT INTO users (name, email, password, role) VALUES (?, ?, ?, ?)");

    let first = insert.run(&params!["Ana", "ana@x.io", "hash", "USER"]).unwrap();
    assert_eq!(first.last_insert_id, Some(1));

    let err = insert.run(&params!["Imposter", "ana@x.io", "hash", "USER"]).unwrap_err();
    assert_eq!(
        err,
        DatabaseError::ConstraintViolation {
            relation: "users".to_string(),
            column: "email".to_string(),
            value: "ana@x.io".to_string(),
        }
    );
    assert_eq!(all_rows(&db, "users").len(), 1);

    let next = insert.run(&params!["Bo", "bo@x.io", "hash", "PROVIDER"]).unwrap();
    assert_eq!(next.last_insert_id, Some(2));
}

#[test]
fn test_pragma_is_inert() {
    let db = accounts_db_with(rejecting());
    assert_eq!(
        db.execute("PRAGMA foreign_keys = ON").unwrap(),
        StatementResult::Pragma
    );
    assert_eq!(db.stats().relations, 1);
}
