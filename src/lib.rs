use anyhow::{Context, Result};
use std::sync::Arc;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;

// ─── Log level ────────────────────────────────────────────────────────────────

/// Controls the verbosity of pilotdiff's internal tracing output.
///
/// Pass to [`init_tracing`] before calling any entry point.
///
/// | Variant | `tracing` level | When to use                              |
/// |---------|-----------------|------------------------------------------|
/// | `Error` | `error`         | `--quiet` / CI scripting                 |
/// | `Info`  | `info`          | Default, per-table state counts          |
/// | `Debug` | `debug`         | `--verbose`: dropped rows, render stats  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Error,
    #[default]
    Info,
    Debug,
}

/// Initialise the global `tracing` subscriber for pilotdiff.
///
/// Respects `RUST_LOG` when set, falling back to `level` otherwise. Library
/// consumers who manage their own subscriber should skip this.
///
/// Only available when the `cli` feature is enabled (pulls in
/// `tracing-subscriber`).
#[cfg(feature = "cli")]
pub fn init_tracing(level: LogLevel) {
    use tracing_subscriber::fmt::format::FmtSpan;

    let default_filter = match level {
        LogLevel::Error => "pilotdiff=error",
        LogLevel::Info => "pilotdiff=info",
        LogLevel::Debug => "pilotdiff=debug",
    };

    tracing_subscriber::fmt()
        .with_span_events(FmtSpan::CLOSE)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();
}

// ─── Public API Facade ───

pub use application::dataset_diff::{compare_values, sort_diffgram, DatasetDiffService};
pub use application::diff::TableDiffer;
pub use application::monitoring::PerfReport;
pub use application::render::{render_section, RenderOptions, SectionLayout};
pub use domain::bookmark::bookmark_name;
pub use domain::dataset::Dataset;
pub use domain::diffgram::{DiffgramDataset, DiffgramRow, DiffgramTable, RowState, TableSummary};
pub use domain::errors::DiffError;
pub use domain::ports::{Differ, MarkupSink, OutputWriter};
pub use domain::print_spec::{PrintSpec, PrintSpecEntry};
pub use domain::report::{Report, SectionReport, Summary};
pub use domain::table::{Column, ColumnDef, ColumnType, Row, Table};
pub use domain::value_objects::{BookmarkName, SectionId};
pub use infrastructure::config::{AppConfig, OutputConfig, ReportConfig, SectionConfig};
pub use infrastructure::markup::XmlMarkupSink;
pub use infrastructure::snapshot::{load_snapshot, SnapshotDocument};

use crate::application::monitoring::MonitoringDiffer;

// ─── Public entry points ───

/// Diff one pilot dataset against its production counterpart.
pub fn diff_dataset(
    pilot: &Dataset,
    production: &Dataset,
) -> std::result::Result<DiffgramDataset, DiffError> {
    DatasetDiffService::new(Arc::new(TableDiffer::new())).diff_dataset(pilot, production)
}

/// Load every configured section, diff it, and assemble the report.
///
/// Use [`run_with_timing`] if you also want a performance report.
pub fn run(cfg: &AppConfig) -> Result<Report> {
    let (report, _) = run_with_timing(cfg)?;
    Ok(report)
}

/// Same as [`run`], plus per-table diff timings.
pub fn run_with_timing(cfg: &AppConfig) -> Result<(Report, PerfReport)> {
    let perf = PerfReport::new();
    let differ = Arc::new(MonitoringDiffer::new(
        Arc::new(TableDiffer::new()),
        Arc::clone(&perf),
    ));
    let service = DatasetDiffService::new(differ);

    let mut sections = Vec::with_capacity(cfg.sections.len());
    for section in &cfg.sections {
        let pilot = load_snapshot(&section.pilot)?;
        let production = load_snapshot(&section.production)?;
        let diffgram = service
            .diff_dataset(&pilot, &production)
            .with_context(|| format!("Failed to diff section `{}`", section.id))?;

        sections.push(SectionReport::new(
            SectionId(section.id.clone()),
            section.display_title(),
            diffgram,
        ));
    }

    let report = Report::new(&cfg.report.title, sections);
    Ok((report, PerfReport::snapshot(&perf)))
}
