use std::io::Write;

use crate::entry::{Entry, Timestamp};
use crate::error::Result;
use crate::parser::Item;

/// Columns of the CSV output, in order.
pub const CSV_COLUMNS: [&str; 9] = [
    "start_date",
    "start_date_is_approx",
    "end_date",
    "end_date_is_approx",
    "places",
    "protocols",
    "description",
    "links",
    "is_unknown",
];

pub struct CsvOptions {
    pub include_header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        CsvOptions {
            include_header: true,
        }
    }
}

fn format_bool(b: bool) -> &'static str {
    if b { "T" } else { "F" }
}

fn format_date(date: Option<Timestamp>) -> String {
    date.map(|d| d.to_string()).unwrap_or_default()
}

fn join_tags<'a>(tags: impl IntoIterator<Item = &'a String>) -> String {
    tags.into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Format one entry as a CSV record matching [`CSV_COLUMNS`].
pub fn entry_to_row(entry: &Entry) -> [String; 9] {
    [
        format_date(entry.start_date),
        format_bool(entry.start_date_is_approx).to_string(),
        format_date(entry.end_date),
        format_bool(entry.end_date_is_approx).to_string(),
        join_tags(&entry.places),
        join_tags(&entry.protocols),
        entry.description.to_markdown().trim().to_string(),
        entry
            .links
            .iter()
            .map(|link| link.to_markdown())
            .collect::<Vec<_>>()
            .join(" "),
        format_bool(entry.is_unknown).to_string(),
    ]
}

/// Writes timeline entries as CSV records.
///
/// Tables are written as soon as the parser finishes them, so everything
/// before a parse error has already reached the writer when it is reported.
pub struct CsvEmitter<W: Write> {
    writer: csv::Writer<W>,
    rows: usize,
}

impl<W: Write> CsvEmitter<W> {
    pub fn new(writer: W, options: &CsvOptions) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(writer);
        if options.include_header {
            writer.write_record(CSV_COLUMNS)?;
        }
        Ok(CsvEmitter { writer, rows: 0 })
    }

    pub fn write_entry(&mut self, entry: &Entry) -> Result<()> {
        self.writer.write_record(entry_to_row(entry))?;
        self.rows += 1;
        Ok(())
    }

    /// Write every table of a parsed document, skipping text between tables.
    pub fn write_items<I>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = Result<Item>>,
    {
        for item in items {
            match item? {
                Item::Text { .. } => continue,
                Item::Table { entries } => {
                    for entry in &entries {
                        self.write_entry(entry)?;
                    }
                    self.writer.flush()?;
                }
            }
        }
        Ok(())
    }

    /// Number of entry rows written so far.
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|err| err.into_error().into())
    }
}

/// Render a whole in-memory document as CSV text.
pub fn render(source: &str, options: &CsvOptions) -> Result<String> {
    let mut emitter = CsvEmitter::new(Vec::new(), options)?;
    emitter.write_items(crate::parser::Parser::new(source.as_bytes()))?;
    let bytes = emitter.finish()?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
