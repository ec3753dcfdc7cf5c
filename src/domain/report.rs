use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::diffgram::{DiffgramDataset, RowState, TableSummary};
use crate::domain::value_objects::SectionId;

/// One logical configuration section: a diffed dataset rendered as a single
/// nested table in the report.
#[derive(Debug, Clone, Serialize)]
pub struct SectionReport {
    pub id: SectionId,
    pub title: String,
    pub tables: Vec<TableSummary>,
    pub diffgram: DiffgramDataset,
}

impl SectionReport {
    pub fn new(id: SectionId, title: &str, diffgram: DiffgramDataset) -> Self {
        SectionReport {
            id,
            title: title.to_string(),
            tables: diffgram.summaries(),
            diffgram,
        }
    }

    pub fn total_changes(&self) -> usize {
        self.tables.iter().map(TableSummary::total_changes).sum()
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct Report {
    pub report_id: String,
    pub title: String,
    pub created_at: String,
    pub sections: Vec<SectionReport>,
    pub summary: Summary,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub total_added: usize,
    pub total_modified: usize,
    pub total_deleted: usize,
    pub total_unchanged: usize,
    pub total_changes: usize,
    pub tables_affected: usize,
}

impl Report {
    pub fn new(title: &str, sections: Vec<SectionReport>) -> Self {
        let tables = || sections.iter().flat_map(|s| s.diffgram.tables.iter());
        let total = |state: RowState| -> usize { tables().map(|t| t.count(state)).sum() };

        let total_added = total(RowState::Added);
        let total_modified = total(RowState::Modified);
        let total_deleted = total(RowState::Deleted);
        let total_unchanged = total(RowState::Unchanged);
        let tables_affected = sections
            .iter()
            .flat_map(|s| s.tables.iter())
            .filter(|t| !t.is_unchanged())
            .count();

        Report {
            report_id: format!(
                "rpt_{}_{}",
                Utc::now().format("%Y%m%d_%H%M%S"),
                Uuid::new_v4().simple()
            ),
            title: title.to_string(),
            created_at: Utc::now().to_rfc3339(),
            sections,
            summary: Summary {
                total_added,
                total_modified,
                total_deleted,
                total_unchanged,
                total_changes: total_added + total_modified + total_deleted,
                tables_affected,
            },
        }
    }
}
