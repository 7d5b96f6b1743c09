//! Statement parser for Hangar.
//!
//! Statement text is tokenized with `sqlparser`'s SQLite lexer, classified by
//! its leading keywords and then turned into a tagged [`Statement`]. The
//! grammar covered is the narrow set of shapes the booking platform issues;
//! anything outside it yields a [`ParseError`] rather than a guess.
//!
//! # Supported statements
//!
//! - `CREATE TABLE [IF NOT EXISTS] name (...)`
//! - `INSERT INTO name (cols) VALUES (...)`
//! - `UPDATE name SET col = ?, ... [WHERE ...]`
//! - `DELETE FROM name [WHERE ...]`
//! - `SELECT cols FROM name [WHERE ...] [ORDER BY ...] [LIMIT ...]`
//! - `BEGIN`, `COMMIT`, `ROLLBACK`, `PRAGMA ...`
//!
//! # Usage
//!
//! ```
//! use hangar_sql::parser::{Parser, Statement, StatementKind};
//!
//! let sql = "SELECT * FROM users WHERE email = ?";
//! assert_eq!(Parser::classify(sql), StatementKind::Select);
//!
//! let statement = Parser::parse(sql).unwrap();
//! assert!(matches!(statement, Statement::Select(_)));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod expr;
mod statement;
pub mod token;
mod types;

pub use expr::*;
pub use statement::*;
pub use token::{Token, TokenExt};
pub use types::*;

/// Errors that can occur during statement parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Malformed statement text.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Well-formed text using a feature the engine does not provide.
    #[error("unsupported feature: {0}")]
    Unsupported(String),

    /// Missing or invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Invalid literal value.
    #[error("invalid literal: {0}")]
    InvalidLiteral(String),

    /// Empty statement.
    #[error("empty statement")]
    EmptyQuery,
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Statement kinds, decided from the leading keywords alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementKind {
    /// `CREATE TABLE`
    CreateTable,
    /// `INSERT`
    Insert,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
    /// `SELECT`; served by either fetch path.
    Select,
    /// `BEGIN` / `START TRANSACTION`
    Begin,
    /// `COMMIT` / `END`
    Commit,
    /// `ROLLBACK`
    Rollback,
    /// `PRAGMA`
    Pragma,
    /// Anything else.
    Unknown,
}

impl StatementKind {
    /// Returns true for statements that open or close a transaction.
    pub fn is_transaction_control(&self) -> bool {
        matches!(
            self,
            StatementKind::Begin | StatementKind::Commit | StatementKind::Rollback
        )
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatementKind::CreateTable => "CREATE TABLE",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Select => "SELECT",
            StatementKind::Begin => "BEGIN",
            StatementKind::Commit => "COMMIT",
            StatementKind::Rollback => "ROLLBACK",
            StatementKind::Pragma => "PRAGMA",
            StatementKind::Unknown => "UNKNOWN",
        };
        write!(f, "{}", name)
    }
}

/// Statement parser.
pub struct Parser;

impl Parser {
    /// Classifies statement text without parsing it fully.
    pub fn classify(sql: &str) -> StatementKind {
        match token::tokenize(sql) {
            Ok(tokens) => classify_tokens(&tokens),
            Err(_) => StatementKind::Unknown,
        }
    }

    /// Parses a single statement. A trailing semicolon is allowed.
    pub fn parse(sql: &str) -> ParseResult<Statement> {
        let tokens = token::tokenize(sql)?;
        if tokens.iter().all(|t| *t == Token::SemiColon) {
            return Err(ParseError::EmptyQuery);
        }

        let kind = classify_tokens(&tokens);
        Statement::from_tokens(kind, tokens)
    }

    /// Splits text holding several statements on top-level semicolons.
    ///
    /// Semicolons inside quoted text and comments do not split. Empty
    /// pieces are dropped. Text the tokenizer rejects is returned whole so
    /// that parsing it reports the error.
    pub fn split_statements(content: &str) -> Vec<&str> {
        let mut statements = Vec::new();
        let Ok(offsets) = token::semicolon_offsets(content) else {
            push_piece(&mut statements, content);
            return statements;
        };

        let mut start = 0;
        for end in offsets {
            push_piece(&mut statements, &content[start..end]);
            start = end + 1;
        }
        push_piece(&mut statements, &content[start..]);
        statements
    }
}

fn push_piece<'a>(statements: &mut Vec<&'a str>, piece: &'a str) {
    let trimmed = piece.trim();
    let only_comments = token::tokenize(trimmed).map_or(false, |t| t.is_empty());
    if !trimmed.is_empty() && !only_comments {
        statements.push(trimmed);
    }
}

fn classify_tokens(tokens: &[Token]) -> StatementKind {
    let Some(first) = tokens.first() else {
        return StatementKind::Unknown;
    };

    if first.is_keyword("CREATE") {
        let is_table = tokens[1..]
            .iter()
            .take(3)
            .take_while(|t| t.is_keyword("TEMP") || t.is_keyword("TEMPORARY") || t.is_keyword("TABLE"))
            .any(|t| t.is_keyword("TABLE"));
        return if is_table {
            StatementKind::CreateTable
        } else {
            StatementKind::Unknown
        };
    }

    let Token::Word(word) = first else {
        return StatementKind::Unknown;
    };
    if word.quote_style.is_some() {
        return StatementKind::Unknown;
    }
    match word.value.to_ascii_uppercase().as_str() {
        "INSERT" => StatementKind::Insert,
        "UPDATE" => StatementKind::Update,
        "DELETE" => StatementKind::Delete,
        "SELECT" => StatementKind::Select,
        "BEGIN" => StatementKind::Begin,
        "START" if tokens.get(1).map_or(false, |t| t.is_keyword("TRANSACTION")) => {
            StatementKind::Begin
        }
        "COMMIT" | "END" => StatementKind::Commit,
        "ROLLBACK" => StatementKind::Rollback,
        "PRAGMA" => StatementKind::Pragma,
        _ => StatementKind::Unknown,
    }
}
