use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use tracing::{info, warn};

use crate::domain::dataset::Dataset;
use crate::domain::errors::DiffError;
use crate::domain::print_spec::{PrintSpec, PrintSpecEntry};
use crate::domain::table::{ColumnDef, Row, Table};

/// On-disk form of one configuration snapshot.
#[derive(Debug, Deserialize)]
pub struct SnapshotDocument {
    pub tables: Vec<TableDocument>,
    #[serde(default)]
    pub print_spec: Vec<PrintSpecEntry>,
}

#[derive(Debug, Deserialize)]
pub struct TableDocument {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub rows: Vec<RowDocument>,
}

/// A row is either a bare value array or an object with a vanity flag.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RowDocument {
    Values(Vec<Value>),
    Row {
        values: Vec<Value>,
        #[serde(default)]
        vanity: bool,
    },
}

impl SnapshotDocument {
    /// Build the dataset. Rows that violate their table's constraints are
    /// logged and skipped; a malformed table definition fails the whole
    /// snapshot.
    pub fn into_dataset(self) -> Result<Dataset, DiffError> {
        let mut tables = Vec::with_capacity(self.tables.len());

        for doc in self.tables {
            let mut table = Table::new(doc.name, doc.columns, &doc.primary_key)?;
            let mut skipped = 0usize;

            for (idx, row) in doc.rows.into_iter().enumerate() {
                let inserted = match row {
                    RowDocument::Values(values) => table.insert_values(values),
                    RowDocument::Row { values, vanity: true } => table.insert_row(Row::vanity(values)),
                    RowDocument::Row { values, vanity: false } => table.insert_row(Row::new(values)),
                };
                if let Err(err) = inserted {
                    warn!(table = %table.name(), row = idx, error = %err, "skipping row");
                    skipped += 1;
                }
            }

            if skipped > 0 {
                warn!(table = %table.name(), skipped, "rows skipped while loading snapshot");
            }
            tables.push(table);
        }

        Ok(Dataset::new(tables, PrintSpec::new(self.print_spec)))
    }
}

/// Read and build a snapshot from a JSON file.
pub fn load_snapshot(path: &Path) -> Result<Dataset> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
    let doc: SnapshotDocument = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse snapshot JSON: {}", path.display()))?;
    let dataset = doc
        .into_dataset()
        .with_context(|| format!("Invalid snapshot: {}", path.display()))?;

    info!(path = %path.display(), tables = dataset.len(), "snapshot loaded");
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn doc(json: Value) -> SnapshotDocument {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn builds_tables_rows_and_print_spec() {
        let ds = doc(json!({
            "tables": [{
                "name": "users",
                "columns": [{"name": "id", "type": "integer"}, {"name": "email", "type": "text"}],
                "primary_key": ["id"],
                "rows": [[1, "a@x"], {"values": [0, null], "vanity": true}]
            }],
            "print_spec": [{"table": 0, "column": 1, "hidden": true, "sort_order": -1}]
        }))
        .into_dataset()
        .unwrap();

        let users = ds.table(0).unwrap();
        assert_eq!(users.len(), 2);
        assert!(!users.rows()[0].is_vanity());
        assert!(users.rows()[1].is_vanity());
        assert!(ds.print_spec().is_hidden(0, 1));
        assert_eq!(ds.print_spec().entry(0, 1).unwrap().sort_order, None);
    }

    #[test]
    fn bad_rows_are_skipped() {
        let ds = doc(json!({
            "tables": [{
                "name": "users",
                "columns": [{"name": "id", "type": "integer"}, {"name": "email", "type": "text"}],
                "primary_key": ["id"],
                "rows": [[1, "a"], [1, "dup"], [2], ["x", "y"], [3, "c"]]
            }]
        }))
        .into_dataset()
        .unwrap();

        let ids: Vec<&Value> = ds.table(0).unwrap().rows().iter().map(|r| r.value(0)).collect();
        assert_eq!(ids, vec![&json!(1), &json!(3)]);
    }

    #[test]
    fn bad_table_definition_fails() {
        let err = doc(json!({
            "tables": [{"name": "t", "columns": [{"name": "a", "type": "text"}], "primary_key": []}]
        }))
        .into_dataset()
        .unwrap_err();
        assert!(matches!(err, DiffError::InvalidInput(_)));
    }

    #[test]
    fn load_snapshot_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tables":[{{"name":"t","columns":[{{"name":"k","type":"text"}}],"primary_key":["k"],"rows":[["a"]]}}]}}"#
        )
        .unwrap();

        let ds = load_snapshot(file.path()).unwrap();
        assert_eq!(ds.table(0).unwrap().len(), 1);
    }

    #[test]
    fn load_snapshot_reports_missing_file() {
        let err = load_snapshot(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read snapshot"));
    }
}
