use std::collections::BTreeMap;
use tracing::debug;

use crate::application::diff::json_equal;
use crate::domain::{
    bookmark::bookmark_name,
    diffgram::{DiffgramDataset, DiffgramRow, DiffgramTable, RowState},
    errors::{DiffError, Result},
    ports::MarkupSink,
    print_spec::PrintSpec,
    table::display_value,
    value_objects::{RowKey, SectionId},
};

/// Knobs for the body renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Text written into cells of levels a leaf row does not reach.
    pub placeholder: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            placeholder: "-".to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SectionLayout
// ─────────────────────────────────────────────────────────────────────────────

/// One hierarchy level: a diffgram table, its visible columns, and the rows
/// of the next level grouped under each of its keys.
struct Level<'a> {
    table: &'a DiffgramTable,
    visible: Vec<usize>,
    /// Visible columns of all shallower levels.
    offset: usize,
    child_groups: BTreeMap<RowKey, Vec<usize>>,
    spans: Vec<usize>,
}

impl Level<'_> {
    fn children_of(&self, row: &DiffgramRow) -> &[usize] {
        self.child_groups
            .get(&self.table.key_of(row))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Flattens a diffed table hierarchy into a grid of rows with row-spans.
///
/// Every physical output row is one leaf path through the hierarchy. A row's
/// span is the number of leaf rows beneath it: 1 for a row without
/// children, otherwise the sum of its children's spans. Equivalently, 1 plus
/// `(group size - 1)` for every sibling group among its descendants.
pub struct SectionLayout<'a> {
    section: &'a SectionId,
    print_spec: &'a PrintSpec,
    levels: Vec<Level<'a>>,
    total_columns: usize,
}

impl<'a> SectionLayout<'a> {
    pub fn new(section: &'a SectionId, dataset: &'a DiffgramDataset) -> Result<Self> {
        let spec = &dataset.print_spec;
        let mut levels: Vec<Level<'a>> = Vec::with_capacity(dataset.tables.len());
        let mut offset = 0;

        for (index, table) in dataset.tables.iter().enumerate() {
            let visible: Vec<usize> = (0..table.columns.len())
                .filter(|&c| !spec.is_hidden(index, c))
                .collect();
            let child_groups = match dataset.tables.get(index + 1) {
                Some(child) => group_by_parent(table, child)?,
                None => BTreeMap::new(),
            };
            let width = visible.len();
            levels.push(Level {
                table,
                visible,
                offset,
                child_groups,
                spans: Vec::new(),
            });
            offset += width;
        }

        for index in (0..levels.len()).rev() {
            let level = &levels[index];
            let spans: Vec<usize> = level
                .table
                .rows
                .iter()
                .map(|row| match level.children_of(row) {
                    [] => 1,
                    children => children.iter().map(|&c| levels[index + 1].spans[c]).sum(),
                })
                .collect();
            levels[index].spans = spans;
        }

        Ok(Self {
            section,
            print_spec: spec,
            levels,
            total_columns: offset,
        })
    }

    /// Visible columns across all levels.
    pub fn total_columns(&self) -> usize {
        self.total_columns
    }

    pub fn row_span(&self, level: usize, row: usize) -> Option<usize> {
        self.levels.get(level)?.spans.get(row).copied()
    }

    /// Physical rows the body will contain.
    pub fn leaf_count(&self) -> usize {
        self.levels.first().map_or(0, |l| l.spans.iter().sum())
    }

    /// One `<tr>` of `<th>` cells naming every visible column, level by level.
    pub fn render_header<S: MarkupSink>(&self, sink: &mut S) -> Result<()> {
        sink.begin_element("tr")?;
        for (index, level) in self.levels.iter().enumerate() {
            for &column in &level.visible {
                sink.begin_element("th")?;
                sink.write_attribute("class", &format!("level{index}"))?;
                sink.write_text(&level.table.columns[column].name)?;
                sink.end_element()?;
            }
        }
        sink.end_element()
    }

    /// Emit the body rows. Returns the number of physical rows written.
    pub fn render<S: MarkupSink>(&self, sink: &mut S, options: &RenderOptions) -> Result<usize> {
        let Some(top) = self.levels.first() else {
            return Ok(0);
        };
        let rows: Vec<usize> = (0..top.table.rows.len()).collect();

        let mut out = Emitter {
            sink,
            options,
            row_open: false,
            rows_emitted: 0,
        };
        self.render_rows(&mut out, 0, &rows)?;

        debug!(section = %self.section, rows = out.rows_emitted, "section rendered");
        Ok(out.rows_emitted)
    }

    fn render_rows<S: MarkupSink>(
        &self,
        out: &mut Emitter<'_, S>,
        level: usize,
        rows: &[usize],
    ) -> Result<()> {
        let current = &self.levels[level];

        for &idx in rows {
            let row = &current.table.rows[idx];

            if !out.row_open {
                out.sink.begin_element("tr")?;
                out.sink.write_attribute("class", row.state.css_class())?;
                out.row_open = true;
            }

            let span = current.spans[idx];
            for &column in &current.visible {
                self.render_cell(out.sink, row, column, span, level)?;
            }

            match current.children_of(row) {
                [] => {
                    let filled = current.offset + current.visible.len();
                    for _ in filled..self.total_columns {
                        out.sink.begin_element("td")?;
                        out.sink.write_attribute("class", row.state.css_class())?;
                        out.sink.write_text(&out.options.placeholder)?;
                        out.sink.end_element()?;
                    }
                    out.sink.end_element()?;
                    out.row_open = false;
                    out.rows_emitted += 1;
                }
                children => self.render_rows(out, level + 1, children)?,
            }
        }

        Ok(())
    }

    /// Write one `<td>` for `column` of `row` at hierarchy `level`.
    pub fn render_cell<S: MarkupSink>(
        &self,
        sink: &mut S,
        row: &DiffgramRow,
        column: usize,
        row_span: usize,
        level: usize,
    ) -> Result<()> {
        let table = self
            .levels
            .get(level)
            .ok_or_else(|| DiffError::invalid(format!("no table at level {level}")))?
            .table;

        sink.begin_element("td")?;
        sink.write_attribute("class", row.state.css_class())?;
        if row_span > 1 {
            sink.write_attribute("rowspan", &row_span.to_string())?;
        }

        let current = row.value(column);
        let text = display_value(current);

        if table.is_key_column(column) {
            self.write_linked(sink, row, column, level, &text)?;
        } else {
            match row.state {
                RowState::Unchanged | RowState::Added => {
                    self.write_linked(sink, row, column, level, &text)?
                }
                RowState::Deleted => {
                    let prior = row.prior(column).unwrap_or(current);
                    write_span(sink, RowState::Deleted, &display_value(prior))?;
                }
                RowState::Modified => {
                    if let Some(prior) = row.prior(column) {
                        if !json_equal(prior, current) {
                            write_span(sink, RowState::Deleted, &display_value(prior))?;
                        }
                    }
                    write_span(sink, RowState::Modified, &text)?;
                }
            }
        }

        sink.end_element()
    }

    /// Text, optionally wrapped in a bookmark anchor or a jump link.
    fn write_linked<S: MarkupSink>(
        &self,
        sink: &mut S,
        row: &DiffgramRow,
        column: usize,
        level: usize,
        text: &str,
    ) -> Result<()> {
        let Some(entry) = self.print_spec.entry(level, column) else {
            return sink.write_text(text);
        };
        let section = entry
            .bookmark_section
            .as_deref()
            .unwrap_or(self.section.as_str());

        if let Some(source) = entry.bookmark {
            let name = bookmark_name(section, &display_value(row.value(source)));
            sink.begin_element("a")?;
            sink.write_attribute("id", name.as_str())?;
            sink.write_text(text)?;
            sink.end_element()
        } else if let Some(source) = entry.jump_to_bookmark {
            let name = bookmark_name(section, &display_value(row.value(source)));
            sink.begin_element("a")?;
            sink.write_attribute("href", &name.fragment())?;
            sink.write_text(text)?;
            sink.end_element()
        } else {
            sink.write_text(text)
        }
    }
}

struct Emitter<'s, S: MarkupSink> {
    sink: &'s mut S,
    options: &'s RenderOptions,
    row_open: bool,
    rows_emitted: usize,
}

fn write_span<S: MarkupSink>(sink: &mut S, state: RowState, text: &str) -> Result<()> {
    sink.begin_element("span")?;
    sink.write_attribute("class", state.css_class())?;
    sink.write_text(text)?;
    sink.end_element()
}

/// Rows of `child` grouped by the leading key values they share with
/// `parent`'s key.
fn group_by_parent(
    parent: &DiffgramTable,
    child: &DiffgramTable,
) -> Result<BTreeMap<RowKey, Vec<usize>>> {
    let prefix = parent.primary_key.len();
    if child.primary_key.len() < prefix {
        return Err(DiffError::invalid(format!(
            "child table `{}` has a shorter key than its parent `{}`",
            child.name, parent.name
        )));
    }

    let mut groups: BTreeMap<RowKey, Vec<usize>> = BTreeMap::new();
    for (idx, row) in child.rows.iter().enumerate() {
        groups
            .entry(child.key_prefix_of(row, prefix))
            .or_default()
            .push(idx);
    }
    Ok(groups)
}

/// Lay out `dataset` and write its body rows into `sink`.
pub fn render_section<S: MarkupSink>(
    section: &SectionId,
    dataset: &DiffgramDataset,
    sink: &mut S,
    options: &RenderOptions,
) -> Result<usize> {
    SectionLayout::new(section, dataset)?.render(sink, options)
}
