//! Literal values and advisory column declarations.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ParseError, ParseResult};

/// A literal value written into statement text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    /// NULL value.
    Null,
    /// Integer value. `TRUE`/`FALSE` are stored as 1/0.
    Integer(i64),
    /// Floating point value.
    Float(f64),
    /// String value.
    String(String),
}

impl Literal {
    /// Returns true if this is a NULL value.
    pub fn is_null(&self) -> bool {
        matches!(self, Literal::Null)
    }

    /// Parses a numeric literal, optionally negated.
    pub fn parse_number(text: &str, negative: bool) -> ParseResult<Self> {
        // Try to parse as integer first, then as float
        if let Ok(i) = text.parse::<i64>() {
            Ok(Literal::Integer(if negative { -i } else { i }))
        } else if let Ok(f) = text.parse::<f64>() {
            Ok(Literal::Float(if negative { -f } else { f }))
        } else {
            Err(ParseError::InvalidLiteral(format!("Invalid number: {}", text)))
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => write!(f, "NULL"),
            Literal::Integer(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::String(s) => write!(f, "'{}'", s.replace('\'', "''")),
        }
    }
}

/// A column as declared in a creation statement.
///
/// Declarations are advisory: the engine records them but does not check
/// inserted rows against them, except for the opt-in uniqueness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    /// Column name.
    pub name: String,
    /// Declared type text (`INTEGER`, `TEXT`, `REAL`, ...), possibly empty.
    pub data_type: String,
    /// Declared `PRIMARY KEY`.
    pub primary_key: bool,
    /// Declared `UNIQUE`.
    pub unique: bool,
    /// Declared `NOT NULL`.
    pub not_null: bool,
}

impl ColumnDef {
    /// Creates a plain column declaration.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            primary_key: false,
            unique: false,
            not_null: false,
        }
    }

    /// Marks the column as unique.
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks the column as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.data_type.is_empty() {
            write!(f, " {}", self.data_type)?;
        }
        if self.primary_key {
            write!(f, " PRIMARY KEY")?;
        }
        if self.unique {
            write!(f, " UNIQUE")?;
        }
        if self.not_null {
            write!(f, " NOT NULL")?;
        }
        Ok(())
    }
}
