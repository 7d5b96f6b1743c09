//! Statement executor.
//!
//! This module applies parsed statements to in-memory relations.
//!
//! # Architecture
//!
//! The executor consists of:
//!
//! - **Value**: Runtime values (integers, reals, text, NULL)
//! - **Row**: An ordered record of named values
//! - **Binder**: Positional parameter binding for placeholders
//! - **Executor**: Runs a statement on one path and reports an `Outcome`
//!
//! # Example
//!
//! ```
//! use hangar_sql::executor::{ExecOptions, Executor, Operation, Outcome, Value};
//! use hangar_sql::parser::Parser;
//! use hangar_sql::storage::Registry;
//!
//! let mut registry = Registry::new();
//! let options = ExecOptions::default();
//! let mut executor = Executor::new(&mut registry, &options);
//!
//! let create = Parser::parse("CREATE TABLE users (id INTEGER, email TEXT)").unwrap();
//! executor.execute(&create, Operation::Run, &[]).unwrap();
//!
//! let insert = Parser::parse("INSERT INTO users (email) VALUES (?)").unwrap();
//! let outcome = executor
//!     .execute(&insert, Operation::Run, &[Value::from("a@x.io")])
//!     .unwrap();
//! assert!(matches!(outcome, Outcome::Changed(summary) if summary.last_insert_id == Some(1)));
//! ```

mod binder;
mod engine;
mod row;
mod value;

pub use binder::*;
pub use engine::*;
pub use row::*;
pub use value::*;
