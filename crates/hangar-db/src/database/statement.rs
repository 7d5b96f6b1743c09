//! Prepared statement handles.

use hangar_sql::executor::{Operation, Outcome, Row, Value};
use hangar_sql::parser::{ParseError, Parser, Statement, StatementKind};

use super::engine::{Database, State};
use super::error::{DatabaseError, DatabaseResult};
use super::result::RunResult;

/// A statement parsed once and executable many times.
///
/// Every call binds fresh parameters and runs against the current state of
/// the database. Parameters are positional: the i-th value binds the i-th
/// `?` of the statement text.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    db: Database,
    sql: String,
    parsed: Result<Statement, ParseError>,
}

impl PreparedStatement {
    pub(crate) fn new(db: Database, sql: &str) -> Self {
        Self {
            db,
            sql: sql.to_string(),
            parsed: Parser::parse(sql),
        }
    }

    /// Returns the statement text.
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Returns the statement kind.
    pub fn kind(&self) -> StatementKind {
        match &self.parsed {
            Ok(statement) => statement.kind(),
            Err(_) => Parser::classify(&self.sql),
        }
    }

    /// Returns the parsed statement, or the reason parsing failed.
    pub fn statement(&self) -> Result<&Statement, &ParseError> {
        self.parsed.as_ref()
    }

    /// Executes the statement for effect.
    ///
    /// Transaction control statements open, commit or roll back a
    /// transaction and report zero changes.
    pub fn run(&self, params: &[Value]) -> DatabaseResult<RunResult> {
        let mut state = self.db.lock();
        self.run_in(&self.db, &mut state, params, true)
    }

    /// Returns the first matching row.
    pub fn fetch_one(&self, params: &[Value]) -> DatabaseResult<Option<Row>> {
        let mut state = self.db.lock();
        self.fetch_one_in(&self.db, &mut state, params)
    }

    /// Returns every matching row in insertion order.
    pub fn fetch_many(&self, params: &[Value]) -> DatabaseResult<Vec<Row>> {
        let mut state = self.db.lock();
        self.fetch_many_in(&self.db, &mut state, params)
    }

    // =========================================================================
    // Locked execution
    // =========================================================================

    fn parsed_or_degrade<T>(&self, db: &Database, neutral: T) -> Result<&Statement, DatabaseResult<T>> {
        match &self.parsed {
            Ok(statement) => Ok(statement),
            Err(e) => Err(db.unsupported(&self.sql, e.to_string(), neutral)),
        }
    }

    pub(crate) fn run_in(
        &self,
        db: &Database,
        state: &mut State,
        params: &[Value],
        allow_control: bool,
    ) -> DatabaseResult<RunResult> {
        let statement = match self.parsed_or_degrade(db, RunResult::default()) {
            Ok(statement) => statement,
            Err(result) => return result,
        };

        if statement.kind().is_transaction_control() {
            if !allow_control {
                return Err(DatabaseError::Transaction(format!(
                    "{} is not allowed inside Database::transaction",
                    statement.kind()
                )));
            }
            db.control(state, statement)?;
            return Ok(RunResult::default());
        }

        match db.dispatch(state, &self.sql, statement, Operation::Run, params)? {
            Outcome::Changed(summary) => Ok(summary.into()),
            Outcome::Unsupported(reason) => db.unsupported(&self.sql, reason, RunResult::default()),
            _ => Ok(RunResult::default()),
        }
    }

    pub(crate) fn fetch_one_in(
        &self,
        db: &Database,
        state: &mut State,
        params: &[Value],
    ) -> DatabaseResult<Option<Row>> {
        let statement = match self.parsed_or_degrade(db, None) {
            Ok(statement) => statement,
            Err(result) => return result,
        };

        match db.dispatch(state, &self.sql, statement, Operation::FetchOne, params)? {
            Outcome::Row { row, .. } => Ok(row),
            Outcome::Unsupported(reason) => db.unsupported(&self.sql, reason, None),
            _ => Ok(None),
        }
    }

    pub(crate) fn fetch_many_in(
        &self,
        db: &Database,
        state: &mut State,
        params: &[Value],
    ) -> DatabaseResult<Vec<Row>> {
        let statement = match self.parsed_or_degrade(db, Vec::new()) {
            Ok(statement) => statement,
            Err(result) => return result,
        };

        match db.dispatch(state, &self.sql, statement, Operation::FetchMany, params)? {
            Outcome::Rows { rows, filter } => {
                db.warn_unfiltered(&self.sql, filter);
                Ok(rows)
            }
            Outcome::Unsupported(reason) => db.unsupported(&self.sql, reason, Vec::new()),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::params;

    fn users() -> Database {
        let db = Database::in_memory();
        db.execute("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT, email TEXT UNIQUE, role TEXT)")
            .unwrap();
        db
    }

    #[test]
    fn test_prepare_run_fetch() {
        let db = users();
        let insert = db.prepare("INSERT INTO users (name, email, role) VALUES (?, ?, ?)");
        assert_eq!(insert.kind(), StatementKind::Insert);

        let result = insert.run(&params!["Ana", "ana@x.io", "USER"]).unwrap();
        assert_eq!(result.last_insert_id, Some(1));
        insert.run(&params!["Bo", "bo@x.io", "ADMIN"]).unwrap();

        let by_email = db.prepare("SELECT * FROM users WHERE email = ?");
        let row = by_email.fetch_one(&params!["bo@x.io"]).unwrap().unwrap();
        assert_eq!(row.id(), Some(2));

        let by_role = db.prepare("SELECT * FROM users WHERE role = ?");
        let rows = by_role.fetch_many(&params!["USER"]).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::text("Ana")));
    }

    #[test]
    fn test_prepared_statement_sees_later_writes() {
        let db = users();
        let all = db.prepare("SELECT * FROM users");
        assert!(all.fetch_many(&[]).unwrap().is_empty());

        db.prepare("INSERT INTO users (name) VALUES (?)")
            .run(&params!["Ana"])
            .unwrap();
        assert_eq!(all.fetch_many(&[]).unwrap().len(), 1);
    }

    #[test]
    fn test_unparsable_statement_degrades() {
        let db = users();
        let stmt = db.prepare("SELECT COUNT(*) FROM users JOIN drones ON 1 = 1");
        assert!(stmt.statement().is_err());
        assert_eq!(stmt.fetch_one(&[]).unwrap(), None);
        assert!(stmt.fetch_many(&[]).unwrap().is_empty());
        assert_eq!(stmt.run(&[]).unwrap(), RunResult::default());

        let strict = Database::new(DatabaseConfig::strict());
        let stmt = strict.prepare("SELECT COUNT(*) FROM users JOIN drones ON 1 = 1");
        assert!(stmt.fetch_one(&[]).unwrap_err().is_unsupported());
    }

    #[test]
    fn test_transaction_control_through_run() {
        let db = users();
        let insert = db.prepare("INSERT INTO users (name) VALUES (?)");

        db.prepare("BEGIN TRANSACTION").run(&[]).unwrap();
        insert.run(&params!["Ana"]).unwrap();
        db.prepare("ROLLBACK").run(&[]).unwrap();

        assert!(db.prepare("SELECT * FROM users").fetch_many(&[]).unwrap().is_empty());
    }
}
