//! # Hangar Database Engine
//!
//! This module provides the embedded database interface on top of the
//! `hangar-sql` statement engine:
//!
//! - Statement text execution and batches
//! - Prepared statement handles (`run`, `fetch_one`, `fetch_many`)
//! - Transactions, both as text (`BEGIN` / `COMMIT` / `ROLLBACK`) and as a
//!   closure
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────┐
//! │                      Database                         │
//! │   ┌──────────────────┐        ┌───────────────────┐   │
//! │   │ PreparedStatement│        │   Transaction     │   │
//! │   │  (parsed once)   │        │ (lock held, undo) │   │
//! │   └──────────────────┘        └───────────────────┘   │
//! │              │                          │             │
//! │              └────────────┬─────────────┘             │
//! │                           ▼                           │
//! │              Mutex<State { registry, snapshot }>      │
//! │                           │                           │
//! │                           ▼                           │
//! │                 hangar_sql::Executor                  │
//! └───────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```
//! use hangar_db::{params, Database};
//!
//! let db = Database::in_memory();
//! db.execute("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, email TEXT UNIQUE)")
//!     .unwrap();
//!
//! let insert = db.prepare("INSERT INTO users (email) VALUES (?)");
//! let result = insert.run(&params!["ana@example.com"]).unwrap();
//! assert_eq!(result.last_insert_id, Some(1));
//!
//! let by_email = db.prepare("SELECT * FROM users WHERE email = ?");
//! let row = by_email.fetch_one(&params!["ana@example.com"]).unwrap();
//! assert_eq!(row.and_then(|r| r.id()), Some(1));
//! ```

mod engine;
mod error;
mod result;
mod statement;
mod transaction;

pub use engine::{Database, DatabaseStats};
pub use error::{DatabaseError, DatabaseResult};
pub use result::{RunResult, StatementResult};
pub use statement::PreparedStatement;
pub use transaction::Transaction;
