//! Relation registry.
//!
//! The registry maps relation names to relations. Relations come into
//! existence on creation statements and are never dropped. Cloning a
//! registry yields an independent snapshot, which is how transactions are
//! rolled back.

use std::collections::HashMap;

use crate::parser::ColumnDef;

use super::relation::Relation;

/// All relations of one database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    /// Relations by name.
    relations: HashMap<String, Relation>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the relation, creating an empty one if absent.
    pub fn ensure_relation(&mut self, name: &str) -> &mut Relation {
        self.relations
            .entry(name.to_string())
            .or_insert_with(|| Relation::new(name))
    }

    /// Creates a relation with declared columns.
    ///
    /// Returns false, leaving the existing relation untouched, if one with
    /// the name already exists.
    pub fn create_relation(&mut self, name: &str, columns: Vec<ColumnDef>) -> bool {
        if self.relations.contains_key(name) {
            return false;
        }
        self.relations
            .insert(name.to_string(), Relation::with_columns(name, columns));
        true
    }

    /// Gets a relation by name.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// Gets a mutable relation by name.
    pub fn relation_mut(&mut self, name: &str) -> Option<&mut Relation> {
        self.relations.get_mut(name)
    }

    /// Checks if a relation exists.
    pub fn contains(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Returns the relation names, sorted.
    pub fn relation_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.relations.keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of relations.
    pub fn len(&self) -> usize {
        self.relations.len()
    }

    /// Returns true if there are no relations.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// Returns the number of rows across all relations.
    pub fn total_rows(&self) -> usize {
        self.relations.values().map(Relation::row_count).sum()
    }
}
