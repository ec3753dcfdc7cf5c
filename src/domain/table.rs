use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::errors::{DiffError, Result};
use crate::domain::value_objects::RowKey;

/// Declared value type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
}

impl ColumnType {
    /// Null is accepted by every type.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (ColumnType::Text, Value::String(_)) => true,
            (ColumnType::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (ColumnType::Float, Value::Number(_)) => true,
            (ColumnType::Boolean, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

/// Column declaration used to build a [`Table`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
    pub ordinal: usize,
    pub is_key: bool,
}

/// One row of values aligned with its table's columns.
///
/// A `vanity` row is a placeholder: when it would be reported as deleted it
/// is dropped instead.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Vec<Value>,
    vanity: bool,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values,
            vanity: false,
        }
    }

    pub fn vanity(values: Vec<Value>) -> Self {
        Self {
            values,
            vanity: true,
        }
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value(&self, ordinal: usize) -> &Value {
        self.values.get(ordinal).unwrap_or(&Value::Null)
    }

    pub fn is_vanity(&self) -> bool {
        self.vanity
    }
}

/// A keyed table of rows. Column order is output order; the primary key is
/// an ordered, non-empty list of column ordinals and is unique per row.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_key: Vec<usize>,
    rows: Vec<Row>,
    key_index: BTreeMap<RowKey, usize>,
}

impl Table {
    /// Build an empty table. `primary_key` lists column names in key order.
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>, primary_key: &[String]) -> Result<Self> {
        let name = name.into();

        if primary_key.is_empty() {
            return Err(DiffError::invalid(format!("table `{name}` has no primary key")));
        }

        let mut seen = BTreeSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(DiffError::invalid(format!(
                    "table `{name}` declares column `{}` twice",
                    col.name
                )));
            }
        }

        let mut key_ordinals = Vec::with_capacity(primary_key.len());
        for key in primary_key {
            let ordinal = columns
                .iter()
                .position(|c| &c.name == key)
                .ok_or_else(|| {
                    DiffError::invalid(format!("table `{name}` has no key column `{key}`"))
                })?;
            if key_ordinals.contains(&ordinal) {
                return Err(DiffError::invalid(format!(
                    "table `{name}` lists key column `{key}` twice"
                )));
            }
            key_ordinals.push(ordinal);
        }

        let columns = columns
            .into_iter()
            .enumerate()
            .map(|(ordinal, def)| Column {
                name: def.name,
                data_type: def.data_type,
                ordinal,
                is_key: key_ordinals.contains(&ordinal),
            })
            .collect();

        Ok(Self {
            name,
            columns,
            primary_key: key_ordinals,
            rows: Vec::new(),
            key_index: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn primary_key(&self) -> &[usize] {
        &self.primary_key
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn is_key_column(&self, ordinal: usize) -> bool {
        self.columns.get(ordinal).is_some_and(|c| c.is_key)
    }

    pub fn key_of(&self, row: &Row) -> RowKey {
        RowKey::from_values(self.primary_key.iter().map(|&c| row.value(c)))
    }

    /// Position of the row holding `key`, if any.
    pub fn position_of(&self, key: &RowKey) -> Option<usize> {
        self.key_index.get(key).copied()
    }

    /// Append a pre-built row.
    pub fn insert_row(&mut self, row: Row) -> Result<()> {
        if row.values.len() != self.columns.len() {
            return Err(DiffError::row(
                &self.name,
                format!(
                    "expected {} values, got {}",
                    self.columns.len(),
                    row.values.len()
                ),
            ));
        }

        if let Some(col) = self
            .columns
            .iter()
            .find(|c| !c.data_type.accepts(row.value(c.ordinal)))
        {
            return Err(DiffError::row(
                &self.name,
                format!(
                    "value {} is not a valid {:?} for column `{}`",
                    row.value(col.ordinal),
                    col.data_type,
                    col.name
                ),
            ));
        }

        let key = self.key_of(&row);
        if self.key_index.contains_key(&key) {
            return Err(DiffError::row(
                &self.name,
                format!("duplicate primary key {}", key.as_str()),
            ));
        }

        self.key_index.insert(key, self.rows.len());
        self.rows.push(row);
        Ok(())
    }

    /// Build a regular (non-vanity) row from raw values and append it.
    pub fn insert_values(&mut self, values: Vec<Value>) -> Result<()> {
        self.insert_row(Row::new(values))
    }

    /// Both tables must agree on column names, types, order and key.
    pub fn ensure_same_schema(&self, other: &Table) -> Result<()> {
        if self.columns.len() != other.columns.len() {
            return Err(DiffError::invalid(format!(
                "`{}` has {} columns but `{}` has {}",
                self.name,
                self.columns.len(),
                other.name,
                other.columns.len()
            )));
        }

        for (a, b) in self.columns.iter().zip(&other.columns) {
            if a.name != b.name || a.data_type != b.data_type {
                return Err(DiffError::invalid(format!(
                    "column {} differs: `{}` ({:?}) vs `{}` ({:?})",
                    a.ordinal, a.name, a.data_type, b.name, b.data_type
                )));
            }
        }

        if self.primary_key != other.primary_key {
            return Err(DiffError::invalid(format!(
                "primary keys of `{}` and `{}` differ",
                self.name, other.name
            )));
        }

        Ok(())
    }
}

/// Text shown for a value in the report. Null renders empty.
pub fn display_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed(""),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> Table {
        Table::new(
            "users",
            vec![
                ColumnDef::new("id", ColumnType::Integer),
                ColumnDef::new("email", ColumnType::Text),
            ],
            &["id".to_string()],
        )
        .unwrap()
    }

    #[test]
    fn new_marks_key_columns() {
        let t = users();
        assert_eq!(t.primary_key(), &[0]);
        assert!(t.columns()[0].is_key);
        assert!(!t.columns()[1].is_key);
        assert_eq!(t.columns()[1].ordinal, 1);
    }

    #[test]
    fn new_rejects_empty_key() {
        let err = Table::new("t", vec![ColumnDef::new("a", ColumnType::Text)], &[]).unwrap_err();
        assert!(matches!(err, DiffError::InvalidInput(_)));
    }

    #[test]
    fn new_rejects_unknown_key_column() {
        let err = Table::new(
            "t",
            vec![ColumnDef::new("a", ColumnType::Text)],
            &["b".to_string()],
        )
        .unwrap_err();
        assert!(err.to_string().contains("no key column `b`"));
    }

    #[test]
    fn insert_values_and_look_up_by_key() {
        let mut t = users();
        t.insert_values(vec![json!(1), json!("a@x")]).unwrap();
        t.insert_row(Row::vanity(vec![json!(0), Value::Null])).unwrap();

        assert_eq!(t.len(), 2);
        let key = RowKey::from_values(&[json!(1)]);
        assert_eq!(t.position_of(&key), Some(0));
        assert_eq!(t.position_of(&RowKey::from_values(&[json!(1.0)])), Some(0));
        assert_eq!(t.position_of(&RowKey::from_values(&[json!(2)])), None);
        assert!(t.rows()[1].is_vanity());
    }

    #[test]
    fn duplicate_key_is_a_row_insertion_error() {
        let mut t = users();
        t.insert_values(vec![json!(1), json!("a")]).unwrap();
        let err = t.insert_values(vec![json!(1), json!("b")]).unwrap_err();
        assert!(matches!(err, DiffError::RowInsertion { .. }));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn wrong_arity_is_rejected() {
        let mut t = users();
        let err = t.insert_values(vec![json!(1)]).unwrap_err();
        assert!(err.to_string().contains("expected 2 values, got 1"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        let mut t = users();
        let err = t.insert_values(vec![json!("one"), json!("a")]).unwrap_err();
        assert!(matches!(err, DiffError::RowInsertion { .. }));
    }

    #[test]
    fn schema_mismatch_is_detected() {
        let a = users();
        let b = Table::new(
            "users",
            vec![
                ColumnDef::new("id", ColumnType::Integer),
                ColumnDef::new("mail", ColumnType::Text),
            ],
            &["id".to_string()],
        )
        .unwrap();
        assert!(a.ensure_same_schema(&a.clone()).is_ok());
        assert!(a.ensure_same_schema(&b).is_err());
    }

    #[test]
    fn display_value_renders_scalars() {
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&json!("x")), "x");
        assert_eq!(display_value(&json!(42)), "42");
        assert_eq!(display_value(&json!(true)), "true");
    }
}
