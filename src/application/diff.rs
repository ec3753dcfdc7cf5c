use serde_json::Value;
use std::collections::BTreeSet;
use tracing::debug;

use crate::domain::{
    diffgram::{DiffgramRow, DiffgramTable, RowState},
    errors::{DiffError, Result},
    ports::Differ,
    table::{Row, Table},
};

// ─── Table Differ (implementation of the port) ───

/// Classifies the rows of a pilot/production table pair.
///
/// Rows are matched by primary key through the production table's key
/// index. Output order: pilot rows in pilot order (Added, Modified or
/// Unchanged), then Deleted rows in production order. Tables reject
/// duplicate keys on insert, so every key matches at most one row.
#[derive(Default)]
pub struct TableDiffer;

impl TableDiffer {
    pub fn new() -> Self {
        Self
    }
}

impl Differ for TableDiffer {
    fn diff_table(
        &self,
        pilot: &Table,
        production: &Table,
        ignored_columns: &BTreeSet<usize>,
    ) -> Result<DiffgramTable> {
        pilot.ensure_same_schema(production)?;

        if let Some(&ordinal) = ignored_columns
            .iter()
            .find(|&&c| c >= pilot.columns().len())
        {
            return Err(DiffError::invalid(format!(
                "ignored column {ordinal} is out of range for `{}`",
                pilot.name()
            )));
        }

        let compared: Vec<usize> = (0..pilot.columns().len())
            .filter(|&c| !pilot.is_key_column(c) && !ignored_columns.contains(&c))
            .collect();

        let mut matched = vec![false; production.len()];
        let mut out = DiffgramTable::with_schema_of(pilot);
        out.rows.reserve(pilot.len() + production.len());

        for row in pilot.rows() {
            let row_out = match production.position_of(&pilot.key_of(row)) {
                Some(idx) => {
                    matched[idx] = true;
                    let counterpart = &production.rows()[idx];
                    if rows_equal(row, counterpart, &compared) {
                        current_row(RowState::Unchanged, row)
                    } else {
                        with_prior(RowState::Modified, pilot, row, counterpart)
                    }
                }
                None => current_row(RowState::Added, row),
            };
            out.rows.push(row_out);
        }

        for (idx, row) in production.rows().iter().enumerate() {
            if matched[idx] {
                continue;
            }
            if row.is_vanity() {
                debug!(table = %production.name(), row = idx, "dropping vanity row");
                continue;
            }
            out.rows.push(with_prior(RowState::Deleted, production, row, row));
        }

        Ok(out)
    }
}

fn rows_equal(a: &Row, b: &Row, compared: &[usize]) -> bool {
    compared.iter().all(|&c| json_equal(a.value(c), b.value(c)))
}

fn current_row(state: RowState, row: &Row) -> DiffgramRow {
    DiffgramRow {
        state,
        values: row.values().to_vec(),
        prior: vec![None; row.values().len()],
    }
}

/// `current` supplies the displayed values, `prior` the production-side
/// values of every non-key column. Deleted rows pass the same row twice.
fn with_prior(state: RowState, table: &Table, current: &Row, prior: &Row) -> DiffgramRow {
    let prior = table
        .columns()
        .iter()
        .map(|col| (!col.is_key).then(|| prior.value(col.ordinal).clone()))
        .collect();
    DiffgramRow {
        state,
        values: current.values().to_vec(),
        prior,
    }
}

// ─── Value equality ───

/// Structural equality for cell values: integers compare exactly, numbers
/// involving a float compare within 1e-9 (so `1` equals `1.0`), objects
/// ignore key order.
pub(crate) fn json_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(na), Value::Number(nb)) if !na.is_f64() && !nb.is_f64() => {
            na.as_i64() == nb.as_i64() && na.as_u64() == nb.as_u64()
        }
        (Value::Number(na), Value::Number(nb)) => match (na.as_f64(), nb.as_f64()) {
            (Some(fa), Some(fb)) => float_eq(fa, fb),
            _ => na == nb,
        },
        (Value::Array(xa), Value::Array(xb)) => {
            xa.len() == xb.len() && xa.iter().zip(xb).all(|(x, y)| json_equal(x, y))
        }
        (Value::Object(ma), Value::Object(mb)) => {
            ma.len() == mb.len()
                && ma
                    .iter()
                    .all(|(k, va)| mb.get(k).is_some_and(|vb| json_equal(va, vb)))
        }
        _ => a == b,
    }
}

fn float_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
