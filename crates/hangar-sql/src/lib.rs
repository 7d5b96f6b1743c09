//! # hangar-sql
//!
//! Statement engine for Hangar.
//!
//! This crate implements:
//! - Tokenizing and classifying statement text
//! - A tagged statement AST (create, insert, update, delete, select,
//!   transaction control)
//! - Positional parameter binding
//! - The in-memory relation registry
//! - Statement execution against the registry

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Statement tokenizer and parser
pub mod parser;

/// Statement execution
pub mod executor;

/// In-memory relation storage
pub mod storage;

pub use executor::{Outcome, Row, Value};
pub use parser::{Parser, Statement, StatementKind};
pub use storage::{Registry, Relation};
