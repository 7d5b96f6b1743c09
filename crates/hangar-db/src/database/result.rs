//! Statement execution results.

use hangar_sql::executor::{ChangeSummary, Row};
use serde::Serialize;

/// Result of running a write statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunResult {
    /// Number of rows changed.
    pub changes: u64,
    /// Identity assigned by an insert.
    pub last_insert_id: Option<i64>,
}

impl From<ChangeSummary> for RunResult {
    fn from(summary: ChangeSummary) -> Self {
        Self {
            changes: summary.changes,
            last_insert_id: summary.last_insert_id,
        }
    }
}

/// Result of executing statement text.
#[derive(Debug, Clone, PartialEq)]
pub enum StatementResult {
    /// CREATE TABLE ran.
    Created {
        /// Relation name.
        relation: String,
    },
    /// INSERT, UPDATE or DELETE ran.
    Changed(RunResult),
    /// SELECT result.
    Rows(Vec<Row>),
    /// Transaction control (BEGIN, COMMIT, ROLLBACK).
    Transaction {
        /// Command name.
        command: String,
    },
    /// PRAGMA, accepted and ignored.
    Pragma,
    /// The statement was not handled and degraded to no effect.
    Ignored {
        /// What was not handled.
        reason: String,
    },
}

impl StatementResult {
    /// Creates a transaction result.
    pub fn transaction(command: impl Into<String>) -> Self {
        StatementResult::Transaction {
            command: command.into(),
        }
    }

    /// Returns the number of rows affected, if applicable.
    pub fn rows_affected(&self) -> Option<u64> {
        match self {
            StatementResult::Changed(result) => Some(result.changes),
            StatementResult::Rows(rows) => Some(rows.len() as u64),
            _ => None,
        }
    }

    /// Returns the rows if this is a SELECT result.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            StatementResult::Rows(rows) => Some(rows),
            _ => None,
        }
    }

    /// Display as a string.
    pub fn display(&self) -> String {
        match self {
            StatementResult::Created { relation } => format!("CREATE TABLE {}", relation),
            StatementResult::Changed(result) => match result.last_insert_id {
                Some(id) => format!("CHANGES {} (last insert id {})", result.changes, id),
                None => format!("CHANGES {}", result.changes),
            },
            StatementResult::Rows(rows) => {
                let mut output = String::new();
                for row in rows {
                    output.push_str(&row.to_string());
                    output.push('\n');
                }
                output.push_str(&format!("({} rows)", rows.len()));
                output
            }
            StatementResult::Transaction { command } => command.clone(),
            StatementResult::Pragma => "PRAGMA".to_string(),
            StatementResult::Ignored { reason } => format!("IGNORED: {}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hangar_sql::executor::Value;

    #[test]
    fn test_statement_result_display() {
        let created = StatementResult::Created {
            relation: "users".to_string(),
        };
        assert_eq!(created.display(), "CREATE TABLE users");
        assert_eq!(created.rows_affected(), None);

        let insert = StatementResult::Changed(RunResult {
            changes: 1,
            last_insert_id: Some(4),
        });
        assert_eq!(insert.display(), "CHANGES 1 (last insert id 4)");
        assert_eq!(insert.rows_affected(), Some(1));
    }

    #[test]
    fn test_rows_display() {
        let rows = vec![Row::from_pairs([("id", Value::Integer(1))])];
        let result = StatementResult::Rows(rows);
        assert_eq!(result.rows().map(|r| r.len()), Some(1));
        assert!(result.display().contains("(1 rows)"));
    }

    #[test]
    fn test_run_result_json() {
        let result = RunResult {
            changes: 1,
            last_insert_id: Some(7),
        };
        let json = serde_json::to_string(&result).unwrap();
        assert_eq!(json, r#"{"changes":1,"last_insert_id":7}"#);
    }
}
