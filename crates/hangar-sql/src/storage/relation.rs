//! Per-relation row storage.
//!
//! A `Relation` owns its rows in insertion order together with the identity
//! counter used to number them. Rows are never renumbered: deleting a row
//! leaves a gap, and the counter never moves backwards.

use crate::executor::{Row, Value, ID_COLUMN};
use crate::parser::ColumnDef;

use super::error::{StorageError, StorageResult};

/// A named, ordered collection of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    /// Relation name.
    name: String,
    /// Rows in insertion order.
    rows: Vec<Row>,
    /// Identity the next insert receives.
    next_id: i64,
    /// Columns as declared by the creating statement (advisory).
    columns: Vec<ColumnDef>,
}

impl Relation {
    /// Creates an empty relation whose first row will get id 1.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            next_id: 1,
            columns: Vec::new(),
        }
    }

    /// Creates an empty relation with declared columns.
    pub fn with_columns(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            ..Self::new(name)
        }
    }

    /// Returns the relation name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared columns.
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the relation holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the identity the next insert will receive.
    pub fn next_id(&self) -> i64 {
        self.next_id
    }

    /// Returns the rows in insertion order.
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    // =========================================================================
    // Row Operations
    // =========================================================================

    /// Appends a row built from `fields`, prefixed with a fresh identity.
    ///
    /// When `enforce_unique` is set, a non-null value equal to an existing
    /// value of a column declared UNIQUE is rejected before the counter
    /// moves.
    pub fn insert(&mut self, fields: Vec<(String, Value)>, enforce_unique: bool) -> StorageResult<i64> {
        if enforce_unique {
            self.check_unique(&fields)?;
        }

        let id = self.next_id;
        self.next_id = id
            .checked_add(1)
            .ok_or_else(|| StorageError::IdentityOverflow(self.name.clone()))?;

        let mut row = Row::new();
        row.set(ID_COLUMN, Value::Integer(id));
        for (name, value) in fields {
            if name != ID_COLUMN {
                row.set(name, value);
            }
        }
        self.rows.push(row);
        Ok(id)
    }

    fn check_unique(&self, fields: &[(String, Value)]) -> StorageResult<()> {
        for column in self.columns.iter().filter(|c| c.unique) {
            let Some((_, value)) = fields.iter().find(|(name, _)| *name == column.name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            if self.rows.iter().any(|row| row.get(&column.name) == Some(value)) {
                return Err(StorageError::UniqueViolation {
                    relation: self.name.clone(),
                    column: column.name.clone(),
                    value: value.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Returns the first row satisfying `predicate`.
    pub fn find<P>(&self, predicate: P) -> Option<&Row>
    where
        P: Fn(&Row) -> bool,
    {
        self.rows.iter().find(|row| predicate(row))
    }

    /// Returns every row satisfying `predicate`, in insertion order.
    pub fn filter<P>(&self, predicate: P) -> Vec<&Row>
    where
        P: Fn(&Row) -> bool,
    {
        self.rows.iter().filter(|row| predicate(row)).collect()
    }

    /// Applies `assignments` to every row whose id equals `id`.
    ///
    /// Assignments to the id column are skipped; identities never change
    /// after insert. Returns the number of rows matched.
    pub fn update_by_id(&mut self, id: Option<&Value>, assignments: &[(String, Value)]) -> u64 {
        let mut changed = 0;
        for row in self.rows.iter_mut().filter(|row| row.get(ID_COLUMN) == id) {
            for (name, value) in assignments.iter().filter(|(name, _)| name != ID_COLUMN) {
                row.set(name.clone(), value.clone());
            }
            changed += 1;
        }
        changed
    }

    /// Removes the first row whose id equals `id`.
    ///
    /// Returns true if a row was removed.
    pub fn delete_by_id(&mut self, id: Option<&Value>) -> bool {
        match self.rows.iter().position(|row| row.get(ID_COLUMN) == id) {
            Some(index) => {
                self.rows.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let mut relation = Relation::new("drones");
        assert_eq!(relation.insert(fields(&[("name", Value::text("a"))]), false), Ok(1));
        assert_eq!(relation.insert(fields(&[("name", Value::text("b"))]), false), Ok(2));

        assert_eq!(relation.row_count(), 2);
        assert_eq!(relation.next_id(), 3);
        assert_eq!(
            relation.rows()[1].columns().collect::<Vec<_>>(),
            vec!["id", "name"]
        );
    }

    #[test]
    fn test_insert_ignores_supplied_id() {
        let mut relation = Relation::new("drones");
        let id = relation
            .insert(fields(&[("id", Value::Integer(99)), ("name", Value::text("a"))]), false)
            .unwrap();
        assert_eq!(id, 1);
        assert_eq!(relation.rows()[0].id(), Some(1));
    }

    #[test]
    fn test_delete_leaves_gap() {
        let mut relation = Relation::new("drones");
        relation.insert(Vec::new(), false).unwrap();
        relation.insert(Vec::new(), false).unwrap();

        assert!(relation.delete_by_id(Some(&Value::Integer(1))));
        assert!(!relation.delete_by_id(Some(&Value::Integer(1))));
        assert_eq!(relation.insert(Vec::new(), false), Ok(3));
    }

    #[test]
    fn test_update_by_id() {
        let mut relation = Relation::new("bookings");
        relation.insert(fields(&[("status", Value::text("PENDING"))]), false).unwrap();
        relation.insert(fields(&[("status", Value::text("PENDING"))]), false).unwrap();

        let changed = relation.update_by_id(
            Some(&Value::Integer(2)),
            &fields(&[("status", Value::text("CONFIRMED"))]),
        );
        assert_eq!(changed, 1);
        assert_eq!(relation.rows()[0].get("status"), Some(&Value::text("PENDING")));
        assert_eq!(relation.rows()[1].get("status"), Some(&Value::text("CONFIRMED")));

        assert_eq!(relation.update_by_id(Some(&Value::Integer(9)), &[]), 0);
    }

    #[test]
    fn test_update_skips_id_assignment() {
        let mut relation = Relation::new("accounts");
        relation.insert(fields(&[("name", Value::text("a"))]), false).unwrap();
        relation.insert(fields(&[("name", Value::text("b"))]), false).unwrap();

        let changed = relation.update_by_id(
            Some(&Value::Integer(2)),
            &fields(&[("id", Value::Integer(1)), ("name", Value::text("c"))]),
        );
        assert_eq!(changed, 1);
        assert_eq!(relation.rows()[1].id(), Some(2));
        assert_eq!(relation.rows()[1].get("name"), Some(&Value::text("c")));

        relation.update_by_id(Some(&Value::Integer(1)), &fields(&[("id", Value::text("x"))]));
        assert_eq!(relation.rows()[0].id(), Some(1));
    }

    #[test]
    fn test_unique_violation_keeps_counter() {
        let columns = vec![ColumnDef::new("email", "TEXT").unique()];
        let mut relation = Relation::with_columns("users", columns);

        relation.insert(fields(&[("email", Value::text("a@x.io"))]), true).unwrap();
        let err = relation
            .insert(fields(&[("email", Value::text("a@x.io"))]), true)
            .unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation { .. }));
        assert_eq!(relation.next_id(), 2);

        // NULLs never collide
        relation.insert(fields(&[("email", Value::Null)]), true).unwrap();
        relation.insert(fields(&[("email", Value::Null)]), true).unwrap();

        // Not enforced unless asked
        relation.insert(fields(&[("email", Value::text("a@x.io"))]), false).unwrap();
        assert_eq!(relation.row_count(), 4);
    }
}
