use anyhow::Result;
use serde::Serialize;

use crate::domain::{
    diffgram::{DiffgramRow, TableSummary},
    ports::OutputWriter,
    report::{Report, Summary},
    table::Column,
};

// ─── Serialisation view types ─────────────────────────────────────────────────
//
// Flattened, presentation-only mirror of the report: columns are listed by
// name and the print specification is left out.

#[derive(Serialize)]
struct JsonReport<'a> {
    report_id: &'a str,
    title: &'a str,
    created_at: &'a str,
    summary: &'a Summary,
    sections: Vec<JsonSection<'a>>,
}

#[derive(Serialize)]
struct JsonSection<'a> {
    id: &'a str,
    title: &'a str,
    tables: Vec<JsonTable<'a>>,
}

#[derive(Serialize)]
struct JsonTable<'a> {
    name: &'a str,
    columns: Vec<&'a str>,
    primary_key: Vec<&'a str>,
    summary: &'a TableSummary,
    rows: &'a [DiffgramRow],
}

fn column_names<'a>(columns: &'a [Column], ordinals: &[usize]) -> Vec<&'a str> {
    ordinals
        .iter()
        .filter_map(|&o| columns.get(o).map(|c| c.name.as_str()))
        .collect()
}

pub struct JsonWriter;

impl OutputWriter for JsonWriter {
    fn format(&self, report: &Report) -> Result<String> {
        let sections = report
            .sections
            .iter()
            .map(|section| JsonSection {
                id: section.id.as_str(),
                title: &section.title,
                tables: section
                    .diffgram
                    .tables
                    .iter()
                    .zip(&section.tables)
                    .map(|(table, summary)| JsonTable {
                        name: &table.name,
                        columns: table.columns.iter().map(|c| c.name.as_str()).collect(),
                        primary_key: column_names(&table.columns, &table.primary_key),
                        summary,
                        rows: &table.rows,
                    })
                    .collect(),
            })
            .collect();

        let view = JsonReport {
            report_id: &report.report_id,
            title: &report.title,
            created_at: &report.created_at,
            summary: &report.summary,
            sections,
        };
        Ok(serde_json::to_string_pretty(&view)?)
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::diffgram::{DiffgramDataset, DiffgramTable, RowState};
    use crate::domain::report::SectionReport;
    use crate::domain::table::{ColumnDef, ColumnType, Table};
    use crate::domain::value_objects::SectionId;
    use serde_json::{json, Value};

    fn make_report() -> Report {
        let source = Table::new(
            "flags",
            vec![
                ColumnDef::new("name", ColumnType::Text),
                ColumnDef::new("enabled", ColumnType::Boolean),
            ],
            &["name".to_string()],
        )
        .unwrap();
        let mut table = DiffgramTable::with_schema_of(&source);
        table.rows.push(DiffgramRow {
            state: RowState::Modified,
            values: vec![json!("beta"), json!(true)],
            prior: vec![None, Some(json!(false))],
        });

        let diffgram = DiffgramDataset {
            tables: vec![table],
            ..Default::default()
        };
        Report::new(
            "Flags",
            vec![SectionReport::new(SectionId("flags".into()), "Feature flags", diffgram)],
        )
    }

    #[test]
    fn json_output_contains_rows_with_prior_values() {
        let output = JsonWriter.format(&make_report()).unwrap();
        let parsed: Value = serde_json::from_str(&output).unwrap();
        let table = &parsed["sections"][0]["tables"][0];

        assert_eq!(table["name"], "flags");
        assert_eq!(table["primary_key"], json!(["name"]));
        assert_eq!(table["summary"]["modified"], 1);
        assert_eq!(table["rows"][0]["state"], "Modified");
        assert_eq!(table["rows"][0]["prior"], json!([null, false]));
        assert_eq!(parsed["summary"]["total_changes"], 1);
    }
}
