use crate::domain::{
    diffgram::DiffgramTable,
    errors::Result,
    report::Report,
    table::Table,
};
use std::collections::BTreeSet;

/// Port: table diff algorithm (implemented by TableDiffer)
pub trait Differ: Send + Sync {
    fn diff_table(
        &self,
        pilot: &Table,
        production: &Table,
        ignored_columns: &BTreeSet<usize>,
    ) -> Result<DiffgramTable>;
}

/// Port: element-level markup output used by the renderer.
///
/// Attributes apply to the most recently begun element and must be written
/// before any text or child element. `end_element` closes the innermost open
/// element.
pub trait MarkupSink {
    fn begin_element(&mut self, name: &str) -> Result<()>;
    fn write_attribute(&mut self, name: &str, value: &str) -> Result<()>;
    fn write_text(&mut self, text: &str) -> Result<()>;
    fn end_element(&mut self) -> Result<()>;
}

/// Port: output formatting (implemented by HtmlWriter, JsonWriter)
pub trait OutputWriter {
    /// Serializes the report to a string (HTML, JSON)
    fn format(&self, report: &Report) -> anyhow::Result<String>;
    /// Extension of the produced file (e.g. "json", "html")
    fn extension(&self) -> &'static str;
}
