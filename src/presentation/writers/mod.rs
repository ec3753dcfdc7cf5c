use crate::application::render::RenderOptions;
use crate::domain::{ports::OutputWriter, report::Report};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use self::{html::HtmlWriter, json::JsonWriter};

pub mod html;
pub mod json;

/// Register available writers - OCP: add new ones without touching main.rs
pub fn all_writers(options: &RenderOptions) -> Vec<Box<dyn OutputWriter>> {
    vec![
        Box::new(JsonWriter),
        Box::new(HtmlWriter::new(options.clone())),
    ]
}

pub fn writer_for(format: &str, options: &RenderOptions) -> Option<Box<dyn OutputWriter>> {
    match format {
        "json" => Some(Box::new(JsonWriter)),
        "html" => Some(Box::new(HtmlWriter::new(options.clone()))),
        _ => None,
    }
}

/// Writes the report to `<dir>/<report_id>.<ext>` via the chosen writer.
///
/// Content goes to a temporary file in `dir` first and is renamed into
/// place, so a failed run never leaves a truncated report behind.
pub fn write_to_file(writer: &dyn OutputWriter, report: &Report, dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output dir: {}", dir.display()))?;

    let content = writer.format(report)?;
    let path = dir.join(format!("{}.{}", report.report_id, writer.extension()));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(&path)
        .with_context(|| format!("Failed to write report: {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_for_known_formats() {
        let options = RenderOptions::default();
        assert_eq!(writer_for("html", &options).unwrap().extension(), "html");
        assert_eq!(writer_for("json", &options).unwrap().extension(), "json");
        assert!(writer_for("sql", &options).is_none());
        assert_eq!(all_writers(&options).len(), 2);
    }

    #[test]
    fn write_to_file_leaves_only_the_report() {
        let dir = tempfile::tempdir().unwrap();
        let report = Report::new("Empty", Vec::new());

        let path = write_to_file(&JsonWriter, &report, dir.path()).unwrap();

        assert_eq!(path, dir.path().join(format!("{}.json", report.report_id)));
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        assert!(fs::read_to_string(&path).unwrap().contains(&report.report_id));
    }
}
