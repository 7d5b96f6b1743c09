//! Databases and statements shared by the integration tests.

use hangar_db::{bootstrap, params, Database, DatabaseConfig, Row, Value};

/// Creation statement of the `accounts` relation used by the scenarios.
pub const ACCOUNTS: &str =
    "CREATE TABLE IF NOT EXISTS accounts (id INTEGER PRIMARY KEY, name TEXT, email TEXT UNIQUE, status TEXT)";

/// A database holding an empty `accounts` relation.
pub fn accounts_db() -> Database {
    accounts_db_with(DatabaseConfig::default())
}

/// A database with the given configuration holding an empty `accounts`
/// relation.
pub fn accounts_db_with(config: DatabaseConfig) -> Database {
    let db = Database::new(config);
    db.execute(ACCOUNTS).expect("create accounts");
    db
}

/// A database with the booking platform schema.
pub fn platform_db(config: DatabaseConfig) -> Database {
    let db = Database::new(config);
    bootstrap::init_schema(&db).expect("init schema");
    db
}

/// Inserts an account and returns its identity.
pub fn insert_account(db: &Database, name: &str, email: &str) -> i64 {
    db.prepare("INSERT INTO accounts (name, email) VALUES (?, ?)")
        .run(&params![name, email])
        .expect("insert account")
        .last_insert_id
        .expect("insert assigns an id")
}

/// Fetches an account by identity.
pub fn account(db: &Database, id: i64) -> Option<Row> {
    db.prepare("SELECT * FROM accounts WHERE id = ?")
        .fetch_one(&params![id])
        .expect("fetch account")
}

/// Every row of a relation, in insertion order.
pub fn all_rows(db: &Database, relation: &str) -> Vec<Row> {
    db.prepare(&format!("SELECT * FROM {}", relation))
        .fetch_many(&[])
        .expect("fetch all")
}

/// The identities of `rows`, in order.
pub fn ids(rows: &[Row]) -> Vec<i64> {
    rows.iter().filter_map(Row::id).collect()
}

/// A text value.
pub fn text(s: &str) -> Value {
    Value::text(s)
}
