use crate::application::monitoring::PerfReport;
use crate::domain::report::Report;
use colored::*;
use tabled::settings::{object::Columns, Alignment, Modify, Style};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct TableRow {
    section: String,
    table: String,
    added: String,
    modified: String,
    deleted: String,
    unchanged: String,
}

#[derive(Tabled)]
struct SummaryRow {
    metric: String,
    value: String,
}

pub fn print_summary(report: &Report) {
    println!();

    println!("{}", "PILOTDIFF CHANGE SUMMARY".bold().cyan());
    println!("{}", report.title.blue());
    println!("Report: {}", report.report_id.bright_yellow());
    println!();

    if report.summary.total_changes == 0 {
        println!("{}", "No changes detected.".italic());
        return;
    }

    let rows: Vec<TableRow> = report
        .sections
        .iter()
        .flat_map(|s| s.tables.iter().map(move |t| (s, t)))
        .filter(|(_, t)| !t.is_unchanged())
        .map(|(s, t)| TableRow {
            section: s.title.clone(),
            table: t.table.bold().to_string(),
            added: t.added.to_string().green().to_string(),
            modified: t.modified.to_string().yellow().to_string(),
            deleted: t.deleted.to_string().red().to_string(),
            unchanged: t.unchanged.to_string().dimmed().to_string(),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=5)).with(Alignment::right()))
        .to_string();
    println!("{table}");

    let s = &report.summary;
    let summary_rows = vec![
        SummaryRow {
            metric: "Total added".into(),
            value: s.total_added.to_string().green().to_string(),
        },
        SummaryRow {
            metric: "Total modified".into(),
            value: s.total_modified.to_string().yellow().to_string(),
        },
        SummaryRow {
            metric: "Total deleted".into(),
            value: s.total_deleted.to_string().red().to_string(),
        },
        SummaryRow {
            metric: "Total changes".into(),
            value: s.total_changes.to_string().bold().to_string(),
        },
        SummaryRow {
            metric: "Tables affected".into(),
            value: s.tables_affected.to_string(),
        },
    ];

    let summary_table = Table::new(summary_rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(1..=1)).with(Alignment::right()))
        .to_string();

    println!();
    println!("{summary_table}");
    println!();
}

// ─── Performance summary ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PerfRow {
    operation: String,
    table: String,
    #[tabled(rename = "rows")]
    rows: String,
    #[tabled(rename = "time (ms)")]
    duration_ms: String,
}

/// Print a performance timing table to stdout.
pub fn print_perf_summary(report: &PerfReport) {
    if report.timings.is_empty() {
        return;
    }

    println!("{}", "PERFORMANCE".bold().cyan());

    let rows: Vec<PerfRow> = report
        .timings
        .iter()
        .map(|t| PerfRow {
            operation: t.operation.dimmed().to_string(),
            table: t.table.bold().to_string(),
            rows: t.rows.to_string(),
            duration_ms: format_duration(t.duration_ms),
        })
        .collect();

    let table = Table::new(rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(2..=3)).with(Alignment::right()))
        .to_string();

    println!("{table}");

    println!(
        "  Total: {} row(s) compared  ·  {} ms elapsed",
        report.total_rows_compared.to_string().bold(),
        format_duration(report.total_ms),
    );
    println!();
}

fn format_duration(ms: u128) -> String {
    if ms >= 1_000 {
        format!("{:.1}s", ms as f64 / 1_000.0).yellow().to_string()
    } else if ms >= 100 {
        ms.to_string().yellow().to_string()
    } else {
        ms.to_string().green().to_string()
    }
}
