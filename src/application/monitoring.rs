use crate::domain::diffgram::{DiffgramTable, RowState};
use crate::domain::errors::Result;
use crate::domain::ports::Differ;
use crate::domain::table::Table;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{info, instrument, warn};

// ─── PerfReport ──────────────────────────────────────────────────────────────

/// A single timed operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OpTiming {
    /// Operation name, e.g. "diff_table".
    pub operation: &'static str,
    /// Table this operation was performed on.
    pub table: String,
    /// Elapsed wall time in milliseconds.
    pub duration_ms: u128,
    /// Number of rows involved (pilot + production).
    pub rows: usize,
}

/// Accumulated performance timings for a single pilotdiff run.
///
/// Shared by every decorator instance of one run via `Arc<Mutex<_>>`.
/// After the run, pass to `presentation::cli_summary::print_perf_summary`
/// to render a human-readable table.
#[derive(Debug, Default, Clone, serde::Serialize)]
pub struct PerfReport {
    pub timings: Vec<OpTiming>,
    pub total_rows_compared: usize,
    pub total_ms: u128,
}

impl PerfReport {
    pub fn new() -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(Self::default()))
    }

    /// Copy of the timings recorded so far. A lock poisoned by a panicking
    /// diff still yields the timings recorded before the panic.
    pub fn snapshot(report: &Arc<Mutex<Self>>) -> Self {
        Self::locked(report).clone()
    }

    fn record(report: &Arc<Mutex<Self>>, timing: OpTiming) {
        let mut r = Self::locked(report);
        r.total_ms += timing.duration_ms;
        r.total_rows_compared += timing.rows;
        r.timings.push(timing);
    }

    fn locked(report: &Arc<Mutex<Self>>) -> MutexGuard<'_, Self> {
        report.lock().unwrap_or_else(|poisoned| {
            warn!("perf report lock poisoned; keeping timings recorded so far");
            poisoned.into_inner()
        })
    }
}

// ─── MonitoringDiffer ────────────────────────────────────────────────────────

/// Decorator: wraps any `Differ`, measures wall time per `diff_table` call,
/// and appends the result to the shared `PerfReport`.
pub struct MonitoringDiffer {
    inner: Arc<dyn Differ>,
    report: Arc<Mutex<PerfReport>>,
}

impl MonitoringDiffer {
    pub fn new(inner: Arc<dyn Differ>, report: Arc<Mutex<PerfReport>>) -> Self {
        Self { inner, report }
    }
}

impl Differ for MonitoringDiffer {
    #[instrument(
        name = "diff_table",
        skip(self, pilot, production, ignored_columns),
        fields(
            table = %pilot.name(),
            pilot.rows = pilot.len(),
            production.rows = production.len(),
        ),
        level = "debug"
    )]
    fn diff_table(
        &self,
        pilot: &Table,
        production: &Table,
        ignored_columns: &BTreeSet<usize>,
    ) -> Result<DiffgramTable> {
        let start = Instant::now();
        let result = self.inner.diff_table(pilot, production, ignored_columns)?;
        let duration_ms = start.elapsed().as_millis();

        let changes = result.count(RowState::Added)
            + result.count(RowState::Modified)
            + result.count(RowState::Deleted);
        info!(table = %pilot.name(), pilot_rows = pilot.len(), production_rows = production.len(), changes, duration_ms, "diff_table completed");

        PerfReport::record(
            &self.report,
            OpTiming {
                operation: "diff_table",
                table: pilot.name().to_string(),
                duration_ms,
                rows: pilot.len() + production.len(),
            },
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::diff::TableDiffer;
    use crate::domain::table::{ColumnDef, ColumnType};
    use serde_json::json;

    #[test]
    fn records_one_timing_per_table() {
        let mut t = Table::new(
            "flags",
            vec![ColumnDef::new("name", ColumnType::Text)],
            &["name".to_string()],
        )
        .unwrap();
        t.insert_values(vec![json!("beta")]).unwrap();

        let report = PerfReport::new();
        let differ = MonitoringDiffer::new(Arc::new(TableDiffer::new()), Arc::clone(&report));
        let out = differ.diff_table(&t, &t, &BTreeSet::new()).unwrap();

        assert_eq!(out.count(RowState::Unchanged), 1);
        let perf = report.lock().unwrap();
        assert_eq!(perf.timings.len(), 1);
        assert_eq!(perf.timings[0].table, "flags");
        assert_eq!(perf.total_rows_compared, 2);
    }

    #[test]
    fn snapshot_survives_poisoned_lock() {
        let report = PerfReport::new();
        PerfReport::record(
            &report,
            OpTiming {
                operation: "diff_table",
                table: "flags".to_string(),
                duration_ms: 3,
                rows: 4,
            },
        );

        let shared = Arc::clone(&report);
        let _ = std::thread::spawn(move || {
            let _guard = shared.lock().unwrap();
            panic!("diff panicked");
        })
        .join();
        assert!(report.is_poisoned());

        let perf = PerfReport::snapshot(&report);
        assert_eq!(perf.timings.len(), 1);
        assert_eq!(perf.total_rows_compared, 4);
    }
}
