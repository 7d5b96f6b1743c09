//! Closure-scoped transactions.

use hangar_sql::executor::{Row, Value};

use super::engine::{Database, State};
use super::error::DatabaseResult;
use super::result::{RunResult, StatementResult};
use super::statement::PreparedStatement;

/// Access to the database inside [`Database::transaction`].
///
/// The database lock is held for the transaction's lifetime. Statements run
/// through this handle see and change the transaction's state; transaction
/// control statements are rejected.
pub struct Transaction<'a> {
    db: &'a Database,
    state: &'a mut State,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(db: &'a Database, state: &'a mut State) -> Self {
        Self { db, state }
    }

    /// Executes statement text without parameters.
    pub fn execute(&mut self, sql: &str) -> DatabaseResult<StatementResult> {
        self.db.execute_in(self.state, sql, false)
    }

    /// Runs a prepared statement for effect.
    pub fn run(&mut self, statement: &PreparedStatement, params: &[Value]) -> DatabaseResult<RunResult> {
        statement.run_in(self.db, self.state, params, false)
    }

    /// Returns the first row matching a prepared statement.
    pub fn fetch_one(
        &mut self,
        statement: &PreparedStatement,
        params: &[Value],
    ) -> DatabaseResult<Option<Row>> {
        statement.fetch_one_in(self.db, self.state, params)
    }

    /// Returns every row matching a prepared statement.
    pub fn fetch_many(
        &mut self,
        statement: &PreparedStatement,
        params: &[Value],
    ) -> DatabaseResult<Vec<Row>> {
        statement.fetch_many_in(self.db, self.state, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabaseError;
    use crate::params;

    #[test]
    fn test_transaction_reads_own_writes() {
        let db = Database::in_memory();
        db.execute("CREATE TABLE bookings (id INTEGER PRIMARY KEY, status TEXT)")
            .unwrap();
        let insert = db.prepare("INSERT INTO bookings (status) VALUES (?)");
        let by_id = db.prepare("SELECT * FROM bookings WHERE id = ?");
        let confirm = db.prepare("UPDATE bookings SET status = ? WHERE id = ?");

        let status = db
            .transaction(|tx| {
                let id = tx.run(&insert, &params!["PENDING"])?.last_insert_id;
                tx.run(&confirm, &params!["CONFIRMED", id])?;
                let row = tx.fetch_one(&by_id, &params![id])?;
                Ok(row.and_then(|r| r.get("status").cloned()))
            })
            .unwrap();

        assert_eq!(status, Some(Value::text("CONFIRMED")));
        assert_eq!(
            db.prepare("SELECT * FROM bookings").fetch_many(&[]).unwrap().len(),
            1
        );
    }

    #[test]
    fn test_transaction_rejects_control_statements() {
        let db = Database::in_memory();
        let result = db.transaction(|tx| tx.execute("COMMIT"));
        assert!(matches!(result, Err(DatabaseError::Transaction(_))));
    }

    #[test]
    fn test_transaction_rejected_while_text_transaction_open() {
        let db = Database::in_memory();
        db.execute("BEGIN").unwrap();
        let result = db.transaction(|_| Ok(()));
        assert!(matches!(result, Err(DatabaseError::Transaction(_))));
        db.execute("ROLLBACK").unwrap();
    }
}
