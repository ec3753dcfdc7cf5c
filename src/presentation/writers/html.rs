use anyhow::{Context, Result};
use sailfish::TemplateOnce;

use crate::application::render::{RenderOptions, SectionLayout};
use crate::domain::{
    diffgram::TableSummary,
    ports::{MarkupSink, OutputWriter},
    report::{Report, SectionReport},
};
use crate::infrastructure::markup::XmlMarkupSink;

/// A section after its nested table has been rendered to markup.
struct RenderedSection<'a> {
    id: &'a str,
    title: &'a str,
    tables: &'a [TableSummary],
    table_html: String,
    rows: usize,
}

#[derive(TemplateOnce)]
#[template(path = "report.stpl")] // base dir declared inside sailfish.toml
struct ReportTemplate<'a> {
    report: &'a Report,
    sections: Vec<RenderedSection<'a>>,
}

pub struct HtmlWriter {
    options: RenderOptions,
}

impl HtmlWriter {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }
}

impl Default for HtmlWriter {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

impl OutputWriter for HtmlWriter {
    fn format(&self, report: &Report) -> Result<String> {
        let sections = report
            .sections
            .iter()
            .map(|section| render_section_table(section, &self.options))
            .collect::<Result<Vec<_>>>()?;

        Ok(ReportTemplate { report, sections }.render_once()?)
    }

    fn extension(&self) -> &'static str {
        "html"
    }
}

fn render_section_table<'a>(
    section: &'a SectionReport,
    options: &RenderOptions,
) -> Result<RenderedSection<'a>> {
    let layout = SectionLayout::new(&section.id, &section.diffgram)
        .with_context(|| format!("Failed to lay out section `{}`", section.id))?;

    let mut sink = XmlMarkupSink::new(Vec::new());
    sink.begin_element("table")?;
    sink.write_attribute("class", "diffgram")?;
    sink.begin_element("thead")?;
    layout.render_header(&mut sink)?;
    sink.end_element()?;
    sink.begin_element("tbody")?;
    let rows = layout.render(&mut sink, options)?;
    sink.end_element()?;
    sink.end_element()?;

    Ok(RenderedSection {
        id: section.id.as_str(),
        title: &section.title,
        tables: &section.tables,
        table_html: String::from_utf8(sink.into_inner()?)?,
        rows,
    })
}
