//! Statement execution engine.
//!
//! The executor applies one parsed statement to a [`Registry`] with the
//! parameters of one call and reports an [`Outcome`]. It never fails for
//! shapes it does not handle: those come back as [`Outcome::Unsupported`]
//! so the caller decides whether to degrade or reject. The only errors are
//! storage constraint errors.

use serde::{Deserialize, Serialize};

use super::{Binder, Row, Value};
use crate::parser::{
    CreateTableStatement, DeleteStatement, InsertStatement, Predicate, Projection,
    SelectStatement, Statement, UpdateStatement,
};
use crate::storage::{Registry, StorageResult};

/// How an update reports its change count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateChanges {
    /// Report one change whenever the relation, assignments and `id`
    /// predicate resolve, even if no row matched.
    #[default]
    LegacyAlwaysOne,
    /// Report the number of rows that matched.
    Matched,
}

/// Behavior switches for the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Change count reported by updates.
    pub update_changes: UpdateChanges,
    /// Reject inserts duplicating a value of a column declared UNIQUE.
    pub enforce_unique: bool,
}

/// The path a statement is executed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Execute for effect.
    Run,
    /// Return at most one row.
    FetchOne,
    /// Return every matching row.
    FetchMany,
}

/// Change report of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChangeSummary {
    /// Number of rows changed.
    pub changes: u64,
    /// Identity assigned by an insert.
    pub last_insert_id: Option<i64>,
}

impl ChangeSummary {
    /// A summary with no changes.
    pub fn none() -> Self {
        Self::default()
    }
}

/// How a fetch filtered its rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// The statement had no `WHERE` clause.
    Unfiltered,
    /// At least one recognized equality test was applied.
    Recognized,
    /// A `WHERE` clause was present but nothing in it was recognized.
    Unrecognized,
}

/// Result of executing one statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A creation statement ran.
    Created {
        /// Relation name.
        relation: String,
        /// False if the relation already existed.
        created: bool,
    },
    /// A write ran.
    Changed(ChangeSummary),
    /// A single-row fetch ran.
    Row {
        /// The row found, if any.
        row: Option<Row>,
        /// How the fetch filtered.
        filter: Filter,
    },
    /// A multi-row fetch ran.
    Rows {
        /// Rows in insertion order.
        rows: Vec<Row>,
        /// How the fetch filtered.
        filter: Filter,
    },
    /// The statement has no effect on data.
    Inert,
    /// The statement shape is not handled on this path.
    Unsupported(String),
}

impl Outcome {
    fn unsupported(reason: impl Into<String>) -> Self {
        Outcome::Unsupported(reason.into())
    }

    /// Returns true for [`Outcome::Unsupported`].
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Outcome::Unsupported(_))
    }
}

/// Executes statements against a registry.
#[derive(Debug)]
pub struct Executor<'a> {
    registry: &'a mut Registry,
    options: &'a ExecOptions,
}

impl<'a> Executor<'a> {
    /// Creates an executor over `registry`.
    pub fn new(registry: &'a mut Registry, options: &'a ExecOptions) -> Self {
        Self { registry, options }
    }

    /// Executes `statement` on the given path with `params`.
    pub fn execute(
        &mut self,
        statement: &Statement,
        operation: Operation,
        params: &[Value],
    ) -> StorageResult<Outcome> {
        let binder = Binder::new(params);

        let outcome = match (statement, operation) {
            (Statement::CreateTable(create), Operation::Run) => self.create(create),
            (Statement::Insert(insert), Operation::Run) => self.insert(insert, &binder)?,
            (Statement::Update(update), Operation::Run) => self.update(update, &binder),
            (Statement::Delete(delete), Operation::Run) => self.delete(delete, &binder),
            (Statement::Select(select), Operation::FetchOne) => self.fetch_one(select, &binder),
            (Statement::Select(select), Operation::FetchMany) => self.fetch_many(select, &binder),
            (Statement::Select(_), Operation::Run) => {
                Outcome::unsupported("SELECT cannot be run for effect")
            }
            (Statement::Pragma(_), _) => Outcome::Inert,
            (Statement::Begin | Statement::Commit | Statement::Rollback, _) => {
                Outcome::unsupported("transaction control is handled by the database")
            }
            (other, _) => Outcome::unsupported(format!("{} cannot be fetched", other.kind())),
        };

        Ok(outcome)
    }

    // =========================================================================
    // Write paths
    // =========================================================================

    fn create(&mut self, create: &CreateTableStatement) -> Outcome {
        let created = self
            .registry
            .create_relation(&create.name, create.columns.clone());
        Outcome::Created {
            relation: create.name.clone(),
            created,
        }
    }

    fn insert(&mut self, insert: &InsertStatement, binder: &Binder<'_>) -> StorageResult<Outcome> {
        if insert.columns.is_empty() {
            return Ok(Outcome::unsupported("INSERT without a column list"));
        }
        let Some(relation) = self.registry.relation_mut(&insert.table) else {
            return Ok(Outcome::Changed(ChangeSummary::none()));
        };

        // Unbound placeholders leave their column out of the row
        let fields = insert
            .columns
            .iter()
            .zip(&insert.values)
            .filter_map(|(column, operand)| {
                binder.resolve(operand).map(|value| (column.clone(), value))
            })
            .collect();

        let id = relation.insert(fields, self.options.enforce_unique)?;
        Ok(Outcome::Changed(ChangeSummary {
            changes: 1,
            last_insert_id: Some(id),
        }))
    }

    fn update(&mut self, update: &UpdateStatement, binder: &Binder<'_>) -> Outcome {
        let Some(id_slot) = update.predicate.as_ref().and_then(Predicate::id_slot) else {
            return Outcome::unsupported("UPDATE without an `id = ?` predicate");
        };
        let Some(relation) = self.registry.relation_mut(&update.table) else {
            return Outcome::Changed(ChangeSummary::none());
        };

        let assignments: Vec<(String, Value)> = update
            .assignments
            .iter()
            .filter_map(|a| binder.resolve(&a.value).map(|value| (a.column.clone(), value)))
            .collect();

        let matched = relation.update_by_id(binder.get(id_slot), &assignments);
        let changes = match self.options.update_changes {
            UpdateChanges::LegacyAlwaysOne => 1,
            UpdateChanges::Matched => matched,
        };
        Outcome::Changed(ChangeSummary {
            changes,
            last_insert_id: None,
        })
    }

    fn delete(&mut self, delete: &DeleteStatement, binder: &Binder<'_>) -> Outcome {
        let Some(id_slot) = delete.predicate.as_ref().and_then(Predicate::id_slot) else {
            return Outcome::unsupported("DELETE without an `id = ?` predicate");
        };
        let Some(relation) = self.registry.relation_mut(&delete.table) else {
            return Outcome::Changed(ChangeSummary::none());
        };

        let removed = relation.delete_by_id(binder.get(id_slot));
        Outcome::Changed(ChangeSummary {
            changes: u64::from(removed),
            last_insert_id: None,
        })
    }

    // =========================================================================
    // Fetch paths
    // =========================================================================

    fn fetch_one(&self, select: &SelectStatement, binder: &Binder<'_>) -> Outcome {
        if let Projection::Expressions(text) = &select.projection {
            return Outcome::unsupported(format!("projection '{}'", text));
        }
        let filter = filter_kind(select.predicate.as_ref());
        let Some(relation) = self.registry.relation(&select.table) else {
            return Outcome::Row { row: None, filter };
        };

        let row = match filter {
            Filter::Unfiltered => relation.rows().first(),
            Filter::Recognized => {
                let tests = equality_tests(select.predicate.as_ref(), binder);
                relation.find(|row| matches_all(row, &tests))
            }
            // Nothing understood: return nothing rather than a wrong row
            Filter::Unrecognized => None,
        };

        Outcome::Row {
            row: row.map(|r| project(r, &select.projection)),
            filter,
        }
    }

    fn fetch_many(&self, select: &SelectStatement, binder: &Binder<'_>) -> Outcome {
        if let Projection::Expressions(text) = &select.projection {
            return Outcome::unsupported(format!("projection '{}'", text));
        }
        let filter = filter_kind(select.predicate.as_ref());
        let Some(relation) = self.registry.relation(&select.table) else {
            return Outcome::Rows {
                rows: Vec::new(),
                filter,
            };
        };

        let rows = match filter {
            Filter::Recognized => {
                let tests = equality_tests(select.predicate.as_ref(), binder);
                relation.filter(|row| matches_all(row, &tests))
            }
            // An unrecognized clause does not filter at all
            Filter::Unfiltered | Filter::Unrecognized => relation.rows().iter().collect(),
        };

        Outcome::Rows {
            rows: rows
                .into_iter()
                .map(|r| project(r, &select.projection))
                .collect(),
            filter,
        }
    }
}

fn filter_kind(predicate: Option<&Predicate>) -> Filter {
    match predicate {
        None => Filter::Unfiltered,
        Some(p) if p.is_recognized() => Filter::Recognized,
        Some(_) => Filter::Unrecognized,
    }
}

/// Column/value pairs of the recognized tests. An unbound slot yields
/// `None`, which only matches rows lacking the column.
fn equality_tests<'b>(
    predicate: Option<&Predicate>,
    binder: &Binder<'b>,
) -> Vec<(&'static str, Option<&'b Value>)> {
    predicate
        .map(|p| {
            p.recognized()
                .into_iter()
                .map(|(column, slot)| (column.as_str(), binder.get(slot)))
                .collect()
        })
        .unwrap_or_default()
}

fn matches_all(row: &Row, tests: &[(&str, Option<&Value>)]) -> bool {
    tests.iter().all(|(column, value)| row.get(column) == *value)
}

fn project(row: &Row, projection: &Projection) -> Row {
    match projection {
        Projection::Columns(columns) => row.project(columns),
        _ => row.clone(),
    }
}
