use serde::Serialize;
use serde_json::Value;

use crate::domain::print_spec::PrintSpec;
use crate::domain::table::{Column, Table};
use crate::domain::value_objects::RowKey;

/// Classification of a row after comparing pilot against production.
///
/// The variant names double as CSS classes in the HTML report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum RowState {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

impl RowState {
    pub const ALL: [RowState; 4] = [
        RowState::Added,
        RowState::Modified,
        RowState::Deleted,
        RowState::Unchanged,
    ];

    pub fn css_class(&self) -> &'static str {
        match self {
            RowState::Added => "Added",
            RowState::Modified => "Modified",
            RowState::Deleted => "Deleted",
            RowState::Unchanged => "Unchanged",
        }
    }
}

impl std::fmt::Display for RowState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.css_class())
    }
}

/// One row of a [`DiffgramTable`].
///
/// `values` holds the current values (pilot side, or production side for a
/// deleted row). `prior` is aligned with the columns and holds the
/// production value of every non-key column for `Modified` and `Deleted`
/// rows; it is `None` everywhere else.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffgramRow {
    pub state: RowState,
    pub values: Vec<Value>,
    pub prior: Vec<Option<Value>>,
}

impl DiffgramRow {
    pub fn value(&self, ordinal: usize) -> &Value {
        self.values.get(ordinal).unwrap_or(&Value::Null)
    }

    pub fn prior(&self, ordinal: usize) -> Option<&Value> {
        self.prior.get(ordinal).and_then(Option::as_ref)
    }

    pub fn has_prior(&self) -> bool {
        self.prior.iter().any(Option::is_some)
    }
}

/// Output of the diff engine for one table pair: the source schema plus a
/// state and prior values per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffgramTable {
    pub name: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<usize>,
    pub rows: Vec<DiffgramRow>,
}

impl DiffgramTable {
    /// Empty diffgram with the schema of `source`.
    pub fn with_schema_of(source: &Table) -> Self {
        Self {
            name: source.name().to_string(),
            columns: source.columns().to_vec(),
            primary_key: source.primary_key().to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn is_key_column(&self, ordinal: usize) -> bool {
        self.columns.get(ordinal).is_some_and(|c| c.is_key)
    }

    pub fn key_of(&self, row: &DiffgramRow) -> RowKey {
        RowKey::from_values(self.primary_key.iter().map(|&c| row.value(c)))
    }

    /// Key made of the first `len` key columns, used to find a row's parent.
    pub fn key_prefix_of(&self, row: &DiffgramRow, len: usize) -> RowKey {
        RowKey::from_values(self.primary_key.iter().take(len).map(|&c| row.value(c)))
    }

    pub fn count(&self, state: RowState) -> usize {
        self.rows.iter().filter(|r| r.state == state).count()
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            table: self.name.clone(),
            added: self.count(RowState::Added),
            modified: self.count(RowState::Modified),
            deleted: self.count(RowState::Deleted),
            unchanged: self.count(RowState::Unchanged),
        }
    }
}

/// Per-table row counts by state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub table: String,
    pub added: usize,
    pub modified: usize,
    pub deleted: usize,
    pub unchanged: usize,
}

impl TableSummary {
    pub fn total_changes(&self) -> usize {
        self.added + self.modified + self.deleted
    }

    pub fn is_unchanged(&self) -> bool {
        self.total_changes() == 0
    }
}

/// A dataset after diffing: one diffgram per source table, in source order,
/// plus the print specification that drives rendering.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DiffgramDataset {
    pub tables: Vec<DiffgramTable>,
    pub print_spec: PrintSpec,
}

impl DiffgramDataset {
    pub fn summaries(&self) -> Vec<TableSummary> {
        self.tables.iter().map(DiffgramTable::summary).collect()
    }
}
