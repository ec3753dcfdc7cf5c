use serde_json::Value;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::domain::{
    dataset::Dataset,
    diffgram::{DiffgramDataset, DiffgramRow, DiffgramTable, RowState},
    errors::{DiffError, Result},
    ports::Differ,
};

// ─────────────────────────────────────────────────────────────────────────────
// DatasetDiffService
// ─────────────────────────────────────────────────────────────────────────────

/// Diffs every table of a pilot dataset against the production dataset at
/// the same position and reassembles the results.
///
/// Change-ignored and sort-key columns come from the pilot's print
/// specification, which is carried into the output unchanged.
pub struct DatasetDiffService {
    differ: Arc<dyn Differ>,
}

impl DatasetDiffService {
    pub fn new(differ: Arc<dyn Differ>) -> Self {
        Self { differ }
    }

    #[instrument(
        name = "diff_dataset",
        skip(self, pilot, production),
        fields(tables = pilot.len()),
        level = "info"
    )]
    pub fn diff_dataset(&self, pilot: &Dataset, production: &Dataset) -> Result<DiffgramDataset> {
        if pilot.len() != production.len() {
            return Err(DiffError::invalid(format!(
                "pilot has {} tables but production has {}",
                pilot.len(),
                production.len()
            )));
        }
        pilot.ensure_hierarchy()?;

        let spec = pilot.print_spec();
        let mut tables = Vec::with_capacity(pilot.len());

        for (index, (p, q)) in pilot.tables().iter().zip(production.tables()).enumerate() {
            let ignored = spec.ignored_columns(index);
            let mut diffgram = self.differ.diff_table(p, q, &ignored)?;
            sort_diffgram(&mut diffgram, &spec.sort_columns(index));

            info!(
                table = %diffgram.name,
                added = diffgram.count(RowState::Added),
                modified = diffgram.count(RowState::Modified),
                deleted = diffgram.count(RowState::Deleted),
                unchanged = diffgram.count(RowState::Unchanged),
                "table diffed"
            );
            tables.push(diffgram);
        }

        Ok(DiffgramDataset {
            tables,
            print_spec: spec.clone(),
        })
    }
}

/// Stable multi-key ascending sort on current values. With no keys the
/// order is left exactly as the differ produced it.
pub fn sort_diffgram(table: &mut DiffgramTable, sort_columns: &[usize]) {
    if sort_columns.is_empty() {
        return;
    }
    table
        .rows
        .sort_by(|a, b| compare_rows(a, b, sort_columns));
}

fn compare_rows(a: &DiffgramRow, b: &DiffgramRow, sort_columns: &[usize]) -> Ordering {
    sort_columns
        .iter()
        .map(|&c| compare_values(a.value(c), b.value(c)))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Total order over cell values: null, booleans, numbers, strings, then
/// arrays and objects by their JSON text.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(i), Some(j)) => i.cmp(&j),
            _ => match (x.as_u64(), y.as_u64()) {
                (Some(i), Some(j)) => i.cmp(&j),
                _ => {
                    let (fx, fy) =
                        (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
                    fx.total_cmp(&fy)
                }
            },
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => {
            a.to_string().cmp(&b.to_string())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}
