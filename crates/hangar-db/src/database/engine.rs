//! Main database engine.
//!
//! The `Database` struct is the top-level entry point for Hangar. It owns
//! the relation registry behind a single lock and provides statement
//! execution, prepared handles and transactions.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use hangar_sql::executor::{ExecOptions, Executor, Filter, Operation, Outcome, Value, ID_COLUMN};
use hangar_sql::parser::{ColumnDef, Parser, Statement};
use hangar_sql::storage::Registry;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::error::{DatabaseError, DatabaseResult};
use super::result::StatementResult;
use super::statement::PreparedStatement;
use super::transaction::Transaction;
use crate::config::{DatabaseConfig, UnsupportedPolicy};

/// Database statistics.
#[derive(Debug, Clone, Default)]
pub struct DatabaseStats {
    /// Number of relations.
    pub relations: usize,
    /// Total rows across all relations.
    pub total_rows: usize,
    /// Total statements executed.
    pub statements_executed: u64,
    /// A transaction is open.
    pub in_transaction: bool,
    /// Uptime.
    pub uptime: Duration,
}

/// Mutable state guarded by the database lock.
#[derive(Debug, Default)]
pub(crate) struct State {
    /// Live relations.
    pub(crate) registry: Registry,
    /// Registry as of the open transaction's BEGIN.
    pub(crate) snapshot: Option<Registry>,
}

#[derive(Debug)]
struct Shared {
    config: DatabaseConfig,
    options: ExecOptions,
    state: Mutex<State>,
    statements: AtomicU64,
    started_at: Instant,
}

/// The main database engine.
///
/// Cloning a `Database` yields another handle to the same relations.
#[derive(Debug, Clone)]
pub struct Database {
    shared: Arc<Shared>,
}

impl Default for Database {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Database {
    /// Creates a database with the given configuration.
    pub fn new(config: DatabaseConfig) -> Self {
        let options = config.exec_options();
        Self {
            shared: Arc::new(Shared {
                config,
                options,
                state: Mutex::new(State::default()),
                statements: AtomicU64::new(0),
                started_at: Instant::now(),
            }),
        }
    }

    /// Creates a database with the default configuration.
    pub fn in_memory() -> Self {
        Self::new(DatabaseConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &DatabaseConfig {
        &self.shared.config
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, State> {
        self.shared.state.lock()
    }

    // =========================================================================
    // Quick Execute API
    // =========================================================================

    /// Prepares a statement. Parsing happens once, here; statements that do
    /// not parse still yield a handle, whose calls report them unsupported.
    pub fn prepare(&self, sql: &str) -> PreparedStatement {
        PreparedStatement::new(self.clone(), sql)
    }

    /// Executes statement text without parameters.
    ///
    /// Handles creation, transaction control and PRAGMA; SELECT returns
    /// every matching row.
    pub fn execute(&self, sql: &str) -> DatabaseResult<StatementResult> {
        let mut state = self.lock();
        self.execute_in(&mut state, sql, true)
    }

    /// Executes several `;`-separated statements in order.
    pub fn execute_batch(&self, sql: &str) -> DatabaseResult<Vec<StatementResult>> {
        Parser::split_statements(sql)
            .into_iter()
            .map(|statement| self.execute(statement))
            .collect()
    }

    /// Runs `f` inside a transaction.
    ///
    /// The lock is held for the whole closure, so other handles wait. If the
    /// closure returns an error or panics, every change it made is undone
    /// and the error or panic is passed on. Statements
    /// must go through `tx`: calling `PreparedStatement::run` on this
    /// database inside the closure would wait on the held lock forever.
    pub fn transaction<F, T>(&self, f: F) -> DatabaseResult<T>
    where
        F: FnOnce(&mut Transaction<'_>) -> DatabaseResult<T>,
    {
        let mut state = self.lock();
        if state.snapshot.is_some() {
            return Err(DatabaseError::Transaction(
                "cannot start a transaction while another is active".to_string(),
            ));
        }

        let snapshot = state.registry.clone();
        debug!("transaction started");

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            let mut tx = Transaction::new(self, &mut state);
            f(&mut tx)
        }));

        match result {
            Ok(Ok(value)) => {
                debug!("transaction committed");
                Ok(value)
            }
            Ok(Err(e)) => {
                state.registry = snapshot;
                info!(error = %e, "transaction rolled back");
                Err(e)
            }
            Err(payload) => {
                state.registry = snapshot;
                warn!("transaction closure panicked; rolled back");
                drop(state);
                panic::resume_unwind(payload)
            }
        }
    }

    // =========================================================================
    // Execution internals
    // =========================================================================

    pub(crate) fn execute_in(
        &self,
        state: &mut State,
        sql: &str,
        allow_control: bool,
    ) -> DatabaseResult<StatementResult> {
        let statement = match Parser::parse(sql) {
            Ok(statement) => statement,
            Err(e) => {
                let reason = e.to_string();
                return self.unsupported(sql, reason.clone(), StatementResult::Ignored { reason });
            }
        };

        if statement.kind().is_transaction_control() {
            if !allow_control {
                return Err(DatabaseError::Transaction(format!(
                    "{} is not allowed inside Database::transaction",
                    statement.kind()
                )));
            }
            return self.control(state, &statement);
        }

        let operation = match statement {
            Statement::Select(_) => Operation::FetchMany,
            _ => Operation::Run,
        };

        match self.dispatch(state, sql, &statement, operation, &[])? {
            Outcome::Created { relation, .. } => Ok(StatementResult::Created { relation }),
            Outcome::Changed(summary) => Ok(StatementResult::Changed(summary.into())),
            Outcome::Rows { rows, filter } => {
                self.warn_unfiltered(sql, filter);
                Ok(StatementResult::Rows(rows))
            }
            Outcome::Row { row, .. } => Ok(StatementResult::Rows(row.into_iter().collect())),
            Outcome::Inert => Ok(StatementResult::Pragma),
            Outcome::Unsupported(reason) => {
                self.unsupported(sql, reason.clone(), StatementResult::Ignored { reason })
            }
        }
    }

    /// Applies BEGIN, COMMIT or ROLLBACK.
    pub(crate) fn control(
        &self,
        state: &mut State,
        statement: &Statement,
    ) -> DatabaseResult<StatementResult> {
        self.shared.statements.fetch_add(1, Ordering::Relaxed);

        match statement {
            Statement::Begin => {
                if state.snapshot.is_some() {
                    return Err(DatabaseError::Transaction(
                        "cannot BEGIN: a transaction is already active".to_string(),
                    ));
                }
                state.snapshot = Some(state.registry.clone());
                info!("BEGIN");
            }
            Statement::Commit => {
                if state.snapshot.take().is_none() {
                    return Err(DatabaseError::Transaction(
                        "cannot COMMIT: no transaction is active".to_string(),
                    ));
                }
                info!("COMMIT");
            }
            Statement::Rollback => {
                let Some(snapshot) = state.snapshot.take() else {
                    return Err(DatabaseError::Transaction(
                        "cannot ROLLBACK: no transaction is active".to_string(),
                    ));
                };
                state.registry = snapshot;
                info!("ROLLBACK");
            }
            other => {
                return Err(DatabaseError::Transaction(format!(
                    "{} is not a transaction command",
                    other.kind()
                )))
            }
        }

        Ok(StatementResult::transaction(statement.kind().to_string()))
    }

    /// Executes one parsed statement against the registry.
    pub(crate) fn dispatch(
        &self,
        state: &mut State,
        sql: &str,
        statement: &Statement,
        operation: Operation,
        params: &[Value],
    ) -> DatabaseResult<Outcome> {
        let start = Instant::now();
        self.shared.statements.fetch_add(1, Ordering::Relaxed);

        match statement {
            Statement::Insert(insert) if insert.columns.iter().any(|c| c == ID_COLUMN) => {
                warn!(sql, "insert names the id column; the generated identity is kept");
            }
            Statement::Update(update) if update.assignments.iter().any(|a| a.column == ID_COLUMN) => {
                warn!(sql, "update assigns the id column; the assignment is skipped");
            }
            _ => {}
        }

        let outcome = Executor::new(&mut state.registry, &self.shared.options)
            .execute(statement, operation, params)?;

        let elapsed = start.elapsed();
        if self.shared.config.statement_logging {
            info!(sql, params = params.len(), elapsed_us = elapsed.as_micros() as u64, "statement executed");
        } else {
            debug!(sql, params = params.len(), "statement executed");
        }
        if elapsed.as_millis() as u64 >= self.shared.config.slow_statement_threshold_ms {
            warn!(sql, elapsed_ms = elapsed.as_millis() as u64, "slow statement");
        }

        Ok(outcome)
    }

    /// Applies the unsupported-statement policy.
    pub(crate) fn unsupported<T>(&self, sql: &str, reason: String, neutral: T) -> DatabaseResult<T> {
        match self.shared.config.unsupported {
            UnsupportedPolicy::Degrade => {
                debug!(sql, reason = %reason, "unsupported statement degraded to a neutral result");
                Ok(neutral)
            }
            UnsupportedPolicy::Reject => Err(DatabaseError::Unsupported {
                sql: sql.to_string(),
                reason,
            }),
        }
    }

    pub(crate) fn warn_unfiltered(&self, sql: &str, filter: Filter) {
        if filter == Filter::Unrecognized {
            warn!(sql, "WHERE clause not recognized; returning all rows unfiltered");
        }
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Returns database statistics.
    pub fn stats(&self) -> DatabaseStats {
        let state = self.lock();

        DatabaseStats {
            relations: state.registry.len(),
            total_rows: state.registry.total_rows(),
            statements_executed: self.shared.statements.load(Ordering::Relaxed),
            in_transaction: state.snapshot.is_some(),
            uptime: self.started_at_elapsed(),
        }
    }

    /// Returns the relation names, sorted.
    pub fn relation_names(&self) -> Vec<String> {
        self.lock().registry.relation_names()
    }

    /// Returns the declared columns of a relation and its row count.
    pub fn describe(&self, relation: &str) -> Option<(Vec<ColumnDef>, usize)> {
        let state = self.lock();
        state
            .registry
            .relation(relation)
            .map(|r| (r.columns().to_vec(), r.row_count()))
    }

    /// Returns true if a BEGIN has not yet been committed or rolled back.
    pub fn in_transaction(&self) -> bool {
        self.lock().snapshot.is_some()
    }

    /// Returns uptime.
    pub fn uptime(&self) -> Duration {
        self.started_at_elapsed()
    }

    fn started_at_elapsed(&self) -> Duration {
        self.shared.started_at.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::RunResult;

    fn accounts() -> Database {
        let db = Database::in_memory();
        db.execute("CREATE TABLE IF NOT EXISTS accounts (id INTEGER PRIMARY KEY, name TEXT, email TEXT UNIQUE, status TEXT)")
            .unwrap();
        db
    }

    #[test]
    fn test_database_execute() {
        let db = accounts();

        let result = db
            .execute("INSERT INTO accounts (name, email) VALUES ('Ana', 'a@x.com')")
            .unwrap();
        assert_eq!(
            result,
            StatementResult::Changed(RunResult {
                changes: 1,
                last_insert_id: Some(1)
            })
        );

        let result = db.execute("SELECT * FROM accounts").unwrap();
        let rows = result.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("name"), Some(&Value::text("Ana")));
    }

    #[test]
    fn test_database_batch() {
        let db = Database::in_memory();

        let results = db
            .execute_batch(
                "CREATE TABLE t1 (id INTEGER PRIMARY KEY);
                 CREATE TABLE t2 (id INTEGER PRIMARY KEY);
                 INSERT INTO t1 (note) VALUES ('x');
                 PRAGMA foreign_keys = ON;",
            )
            .unwrap();

        assert_eq!(results.len(), 4);
        assert_eq!(results[3], StatementResult::Pragma);
        assert_eq!(db.relation_names(), vec!["t1", "t2"]);
    }

    #[test]
    fn test_text_rollback_restores_rows_and_counter() {
        let db = accounts();
        db.execute("INSERT INTO accounts (name) VALUES ('A')").unwrap();

        db.execute("BEGIN TRANSACTION").unwrap();
        assert!(db.in_transaction());
        db.execute("INSERT INTO accounts (name) VALUES ('B')").unwrap();
        db.execute("ROLLBACK").unwrap();

        assert!(!db.in_transaction());
        assert_eq!(db.stats().total_rows, 1);

        let result = db.execute("INSERT INTO accounts (name) VALUES ('C')").unwrap();
        assert_eq!(result.rows_affected(), Some(1));
        assert_eq!(
            result,
            StatementResult::Changed(RunResult {
                changes: 1,
                last_insert_id: Some(2)
            })
        );
    }

    #[test]
    fn test_transaction_misuse() {
        let db = Database::in_memory();
        assert!(matches!(db.execute("COMMIT"), Err(DatabaseError::Transaction(_))));
        assert!(matches!(db.execute("ROLLBACK"), Err(DatabaseError::Transaction(_))));

        db.execute("BEGIN").unwrap();
        assert!(matches!(db.execute("BEGIN"), Err(DatabaseError::Transaction(_))));
        db.execute("COMMIT").unwrap();
    }

    #[test]
    fn test_closure_transaction_rolls_back_on_error() {
        let db = accounts();
        let insert = db.prepare("INSERT INTO accounts (name) VALUES (?)");

        let result: DatabaseResult<()> = db.transaction(|tx| {
            tx.run(&insert, &[Value::text("A")])?;
            tx.run(&insert, &[Value::text("B")])?;
            Err(DatabaseError::Transaction("simulated failure".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(db.stats().total_rows, 0);

        let id = db
            .transaction(|tx| Ok(tx.run(&insert, &[Value::text("C")])?.last_insert_id))
            .unwrap();
        assert_eq!(id, Some(1));
    }

    #[test]
    fn test_unsupported_policy() {
        let db = accounts();
        let result = db.execute("DELETE FROM accounts WHERE name = 'x'").unwrap();
        assert!(matches!(result, StatementResult::Ignored { .. }));

        let strict = Database::new(DatabaseConfig::strict());
        let err = strict.execute("VACUUM").unwrap_err();
        assert!(err.is_unsupported());
    }

    #[test]
    fn test_database_stats() {
        let db = accounts();
        db.execute("INSERT INTO accounts (name) VALUES ('A')").unwrap();
        db.execute("INSERT INTO accounts (name) VALUES ('B')").unwrap();

        let stats = db.stats();
        assert_eq!(stats.relations, 1);
        assert_eq!(stats.total_rows, 2);
        assert_eq!(stats.statements_executed, 3);
        assert!(!stats.in_transaction);
    }

    #[test]
    fn test_clones_share_state() {
        let db = accounts();
        let other = db.clone();
        other.execute("INSERT INTO accounts (name) VALUES ('A')").unwrap();
        assert_eq!(db.stats().total_rows, 1);
    }

    #[test]
    fn test_describe() {
        let db = accounts();
        db.execute("INSERT INTO accounts (name) VALUES ('A')").unwrap();

        let (columns, rows) = db.describe("accounts").unwrap();
        assert_eq!(rows, 1);
        assert_eq!(columns.len(), 4);
        assert_eq!(columns[2].name, "email");
        assert!(columns[2].unique);
        assert!(db.describe("missing").is_none());
    }
}
