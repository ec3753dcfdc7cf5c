use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use crate::domain::errors::{DiffError, Result};
use crate::domain::ports::MarkupSink;

/// [`MarkupSink`] over a `quick_xml::Writer`.
///
/// A begun element is held back until its first child, text or end so that
/// attributes can still be attached. Elements are always closed with an
/// explicit end tag (`<td></td>`, never `<td/>`), which keeps the output
/// valid HTML.
pub struct XmlMarkupSink<W: Write> {
    writer: Writer<W>,
    pending: Option<BytesStart<'static>>,
    open: Vec<String>,
}

impl<W: Write> XmlMarkupSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: Writer::new(inner),
            pending: None,
            open: Vec::new(),
        }
    }

    /// Hand back the underlying writer. Fails if elements are still open.
    pub fn into_inner(self) -> Result<W> {
        if let Some(name) = self.open.last() {
            return Err(DiffError::invalid(format!(
                "markup finished with <{name}> still open"
            )));
        }
        Ok(self.writer.into_inner())
    }

    fn flush_pending(&mut self) -> Result<()> {
        if let Some(start) = self.pending.take() {
            self.write(Event::Start(start))?;
        }
        Ok(())
    }

    fn write(&mut self, event: Event<'_>) -> Result<()> {
        self.writer
            .write_event(event)
            .map_err(|e| DiffError::Markup(e.to_string()))
    }
}

impl<W: Write> MarkupSink for XmlMarkupSink<W> {
    fn begin_element(&mut self, name: &str) -> Result<()> {
        self.flush_pending()?;
        self.pending = Some(BytesStart::new(name.to_string()));
        self.open.push(name.to_string());
        Ok(())
    }

    fn write_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        match self.pending.as_mut() {
            Some(start) => {
                start.push_attribute((name, value));
                Ok(())
            }
            None => Err(DiffError::invalid(format!(
                "attribute `{name}` written outside a start tag"
            ))),
        }
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.flush_pending()?;
        if text.is_empty() {
            return Ok(());
        }
        self.write(Event::Text(BytesText::new(text)))
    }

    fn end_element(&mut self) -> Result<()> {
        self.flush_pending()?;
        let name = self
            .open
            .pop()
            .ok_or_else(|| DiffError::invalid("end_element without an open element"))?;
        self.write(Event::End(BytesEnd::new(name)))
    }
}
