//! # hangar-db
//!
//! Embedded, in-memory database for the Hangar booking platform.
//!
//! This crate provides:
//!
//! - **Database**: Owns the relation registry and runs statements against
//!   it under a single lock. Handles are cheap to clone and share across
//!   threads.
//!
//! - **Prepared statements**: Parse once, then `run`, `fetch_one` or
//!   `fetch_many` with positional parameters.
//!
//! - **Transactions**: `BEGIN`/`COMMIT`/`ROLLBACK` statements and
//!   [`Database::transaction`] both restore the prior state on rollback.
//!
//! - **Bootstrap**: The booking platform's schema.
//!
//! # Quick Start
//!
//! ```
//! use hangar_db::{bootstrap, params, Database};
//!
//! let db = Database::in_memory();
//! bootstrap::init_schema(&db).unwrap();
//!
//! let insert = db.prepare("INSERT INTO services (name, base_price, category) VALUES (?, ?, ?)");
//! insert.run(&params!["Aerial survey", 120.0, "MAPPING"]).unwrap();
//!
//! let services = db.prepare("SELECT * FROM services WHERE category = ?");
//! assert_eq!(services.fetch_many(&params!["MAPPING"]).unwrap().len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Database engine - the main entry point for Hangar.
pub mod database;

/// Database configuration.
pub mod config;

/// Booking platform schema.
pub mod bootstrap;

// Re-export commonly used types
pub use config::{DatabaseConfig, UnsupportedPolicy};
pub use database::{
    Database, DatabaseError, DatabaseResult, DatabaseStats, PreparedStatement, RunResult,
    StatementResult, Transaction,
};
pub use hangar_sql::executor::{Row, UpdateChanges, Value};

/// Builds a `Vec<Value>` of statement parameters.
///
/// ```
/// use hangar_db::{params, Value};
///
/// let params = params!["ana@example.com", 42, 9.5, true, None::<i64>];
/// assert_eq!(params[3], Value::Integer(1));
/// assert_eq!(params[4], Value::Null);
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::Value>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::Value::from($value)),+]
    };
}
