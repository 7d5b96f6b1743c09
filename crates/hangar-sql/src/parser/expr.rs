//! Operands, projections and predicates.
//!
//! Predicates are kept shallow: a `WHERE` clause is split on top-level
//! `AND` into conjuncts, and only `column = ?` conjuncts over a fixed set of
//! columns are evaluated. Everything else is carried as text so callers and
//! tests can see what was not understood.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Literal;

/// Value source for an insert value or an update assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// A `?` placeholder; the slot is its position among all placeholders
    /// of the statement.
    Placeholder(usize),
    /// A literal written into the statement text.
    Literal(Literal),
}

impl Operand {
    /// Returns the placeholder slot, if this is a placeholder.
    pub fn slot(&self) -> Option<usize> {
        match self {
            Operand::Placeholder(slot) => Some(*slot),
            Operand::Literal(_) => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Placeholder(_) => write!(f, "?"),
            Operand::Literal(lit) => write!(f, "{}", lit),
        }
    }
}

/// Columns whose `column = ?` form is a recognized predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecognizedColumn {
    /// `id = ?`
    Id,
    /// `email = ?`
    Email,
    /// `user_id = ?`
    UserId,
    /// `booking_id = ?`
    BookingId,
    /// `category = ?`
    Category,
    /// `provider_id = ?`
    ProviderId,
    /// `status = ?`
    Status,
    /// `role = ?`
    Role,
}

impl RecognizedColumn {
    /// Every recognized column.
    pub const ALL: [RecognizedColumn; 8] = [
        RecognizedColumn::Id,
        RecognizedColumn::Email,
        RecognizedColumn::UserId,
        RecognizedColumn::BookingId,
        RecognizedColumn::Category,
        RecognizedColumn::ProviderId,
        RecognizedColumn::Status,
        RecognizedColumn::Role,
    ];

    /// Looks up a column name (case-insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(name))
    }

    /// Returns the column name.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecognizedColumn::Id => "id",
            RecognizedColumn::Email => "email",
            RecognizedColumn::UserId => "user_id",
            RecognizedColumn::BookingId => "booking_id",
            RecognizedColumn::Category => "category",
            RecognizedColumn::ProviderId => "provider_id",
            RecognizedColumn::Status => "status",
            RecognizedColumn::Role => "role",
        }
    }
}

impl fmt::Display for RecognizedColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One `AND`-separated piece of a `WHERE` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Conjunct {
    /// `column = ?`
    Equals {
        /// Column name as written (qualifier stripped).
        column: String,
        /// Placeholder slot.
        slot: usize,
    },
    /// Anything else, kept as normalized text.
    Other(String),
}

impl Conjunct {
    /// Returns the recognized column and slot, if this conjunct is a
    /// recognized predicate.
    pub fn recognized(&self) -> Option<(RecognizedColumn, usize)> {
        match self {
            Conjunct::Equals { column, slot } => {
                RecognizedColumn::from_name(column).map(|c| (c, *slot))
            }
            Conjunct::Other(_) => None,
        }
    }
}

impl fmt::Display for Conjunct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conjunct::Equals { column, .. } => write!(f, "{} = ?", column),
            Conjunct::Other(text) => write!(f, "{}", text),
        }
    }
}

/// A parsed `WHERE` clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Conjuncts in textual order.
    pub conjuncts: Vec<Conjunct>,
}

impl Predicate {
    /// Creates a predicate from conjuncts.
    pub fn new(conjuncts: Vec<Conjunct>) -> Self {
        Self { conjuncts }
    }

    /// Recognized `column = ?` tests in textual order.
    pub fn recognized(&self) -> Vec<(RecognizedColumn, usize)> {
        self.conjuncts.iter().filter_map(Conjunct::recognized).collect()
    }

    /// Returns true if at least one conjunct is recognized.
    pub fn is_recognized(&self) -> bool {
        self.conjuncts.iter().any(|c| c.recognized().is_some())
    }

    /// Conjuncts that are not recognized predicates.
    pub fn unrecognized(&self) -> Vec<&Conjunct> {
        self.conjuncts
            .iter()
            .filter(|c| c.recognized().is_none())
            .collect()
    }

    /// Slot of the `id = ?` test, if present.
    pub fn id_slot(&self) -> Option<usize> {
        self.conjuncts.iter().find_map(|c| match c.recognized() {
            Some((RecognizedColumn::Id, slot)) => Some(slot),
            _ => None,
        })
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, conjunct) in self.conjuncts.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{}", conjunct)?;
        }
        Ok(())
    }
}

/// Select list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Projection {
    /// `*`
    All,
    /// Plain column names.
    Columns(Vec<String>),
    /// Expressions the engine does not evaluate (aggregates, arithmetic).
    Expressions(String),
}
