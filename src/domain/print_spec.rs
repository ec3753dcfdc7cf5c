use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Rendering and diffing directives for one `(table, column)` pair.
///
/// Integer attributes accept `-1` (or absence) as "not set" when read from a
/// snapshot document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintSpecEntry {
    pub table: usize,
    pub column: usize,
    #[serde(default)]
    pub hidden: bool,
    /// Ascending sort precedence; lower sorts first.
    #[serde(default, deserialize_with = "optional_ordinal")]
    pub sort_order: Option<u32>,
    /// Ordinal of the column whose value names this cell's anchor.
    #[serde(default, deserialize_with = "optional_ordinal")]
    pub bookmark: Option<usize>,
    /// Ordinal of the column whose value names this cell's link target.
    #[serde(default, deserialize_with = "optional_ordinal")]
    pub jump_to_bookmark: Option<usize>,
    #[serde(default)]
    pub change_ignored: bool,
    /// Section namespace for anchor and link names; defaults to the section
    /// being rendered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmark_section: Option<String>,
}

fn optional_ordinal<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64>,
{
    match Option::<i64>::deserialize(deserializer)? {
        None => Ok(None),
        Some(n) if n < 0 => Ok(None),
        Some(n) => T::try_from(n)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("ordinal {n} is out of range"))),
    }
}

impl PrintSpecEntry {
    pub fn new(table: usize, column: usize) -> Self {
        Self {
            table,
            column,
            hidden: false,
            sort_order: None,
            bookmark: None,
            jump_to_bookmark: None,
            change_ignored: false,
            bookmark_section: None,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn sort(mut self, precedence: u32) -> Self {
        self.sort_order = Some(precedence);
        self
    }

    pub fn bookmark(mut self, source_column: usize) -> Self {
        self.bookmark = Some(source_column);
        self
    }

    pub fn jump_to(mut self, source_column: usize) -> Self {
        self.jump_to_bookmark = Some(source_column);
        self
    }

    pub fn ignore_changes(mut self) -> Self {
        self.change_ignored = true;
        self
    }

    pub fn in_section(mut self, section: impl Into<String>) -> Self {
        self.bookmark_section = Some(section.into());
        self
    }
}

/// The side table of [`PrintSpecEntry`] values for a whole dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<PrintSpecEntry>", into = "Vec<PrintSpecEntry>")]
pub struct PrintSpec {
    entries: Vec<PrintSpecEntry>,
}

impl From<Vec<PrintSpecEntry>> for PrintSpec {
    fn from(entries: Vec<PrintSpecEntry>) -> Self {
        PrintSpec::new(entries)
    }
}

impl From<PrintSpec> for Vec<PrintSpecEntry> {
    fn from(spec: PrintSpec) -> Self {
        spec.entries
    }
}

impl PrintSpec {
    /// Later entries for the same `(table, column)` replace earlier ones.
    pub fn new(entries: impl IntoIterator<Item = PrintSpecEntry>) -> Self {
        let mut spec = Self::default();
        for entry in entries {
            spec.insert(entry);
        }
        spec
    }

    pub fn insert(&mut self, entry: PrintSpecEntry) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.table == entry.table && e.column == entry.column)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    pub fn entries(&self) -> &[PrintSpecEntry] {
        &self.entries
    }

    pub fn entry(&self, table: usize, column: usize) -> Option<&PrintSpecEntry> {
        self.entries
            .iter()
            .find(|e| e.table == table && e.column == column)
    }

    pub fn is_hidden(&self, table: usize, column: usize) -> bool {
        self.entry(table, column).is_some_and(|e| e.hidden)
    }

    /// Ordinals excluded from change detection for `table`.
    pub fn ignored_columns(&self, table: usize) -> BTreeSet<usize> {
        self.entries
            .iter()
            .filter(|e| e.table == table && e.change_ignored)
            .map(|e| e.column)
            .collect()
    }

    /// Sort-key ordinals for `table`, highest precedence first. Equal
    /// precedence values fall back to column order.
    pub fn sort_columns(&self, table: usize) -> Vec<usize> {
        let mut keys: Vec<(u32, usize)> = self
            .entries
            .iter()
            .filter(|e| e.table == table)
            .filter_map(|e| e.sort_order.map(|order| (order, e.column)))
            .collect();
        keys.sort_unstable();
        keys.into_iter().map(|(_, column)| column).collect()
    }
}
