use std::collections::BTreeSet;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

use crate::ast::{Link, Markdown};
use crate::error::{Error, Result};
use crate::token::Loc;

/// A timeline table is rejected unless its header is exactly these names.
pub const EXPECTED_COLUMN_NAMES: [&str; 7] = [
    "start date",
    "end date",
    "places",
    "protocols",
    "description",
    "links",
    "?",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"];
const DATE_FORMAT: &str = "%Y-%m-%d";

/// A start or end date, keeping whether the source gave a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Timestamp {
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timestamp::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
            Timestamp::DateTime(datetime) => write!(f, "{}", datetime.format(DATETIME_FORMATS[0])),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse a date cell: `""` or `"ongoing"` mean no date, a leading `~` marks
/// the date as approximate, and the rest is tried as a datetime with seconds,
/// a datetime without seconds, then a plain date.
pub fn parse_datetime(s: &str) -> std::result::Result<(Option<Timestamp>, bool), chrono::ParseError> {
    if s.is_empty() || s == "ongoing" {
        return Ok((None, false));
    }

    let (s, is_approx) = match s.strip_prefix('~') {
        Some(rest) => (rest, true),
        None => (s, false),
    };

    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(s, format) {
            return Ok((Some(Timestamp::DateTime(datetime)), is_approx));
        }
    }
    let date = NaiveDate::parse_from_str(s, DATE_FORMAT)?;
    Ok((Some(Timestamp::Date(date)), is_approx))
}

/// One parsed row of a timeline table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    pub start_date: Option<Timestamp>,
    pub start_date_is_approx: bool,
    pub end_date: Option<Timestamp>,
    pub end_date_is_approx: bool,
    pub is_ongoing: bool,
    pub places: BTreeSet<String>,
    pub protocols: BTreeSet<String>,
    pub description: Markdown,
    pub links: Vec<Link>,
    pub is_unknown: bool,
    /// Source line of the row.
    pub line: u32,
}

impl Entry {
    /// Build an entry from the cells of a table row starting at `loc`.
    pub fn from_row(cells: Vec<Markdown>, loc: Loc) -> Result<Entry> {
        let cells: [Markdown; 7] = cells.try_into().map_err(|cells: Vec<Markdown>| {
            Error::structure(
                loc,
                format!(
                    "expected {} cells in table row, found {}",
                    EXPECTED_COLUMN_NAMES.len(),
                    cells.len()
                ),
            )
        })?;
        let [start_date, end_date, places, protocols, description, links, is_unknown] = cells;

        let text = |cell: &Markdown, column: &str| -> Result<String> {
            cell.to_text()
                .map(|text| text.trim().to_string())
                .map_err(|err| Error::semantic(loc, format!("{column} column: {err}")))
        };
        let date = |text: &str, column: &str| {
            parse_datetime(text).map_err(|err| {
                Error::semantic(loc, format!("{column} column: invalid date {text:?}: {err}"))
            })
        };

        let start_text = text(&start_date, "start date")?;
        let (start_date, start_date_is_approx) = date(&start_text, "start date")?;
        let end_text = text(&end_date, "end date")?;
        let (end_date, end_date_is_approx) = date(&end_text, "end date")?;

        Ok(Entry {
            start_date,
            start_date_is_approx,
            end_date,
            end_date_is_approx,
            is_ongoing: end_text == "ongoing",
            places: split_tags(&text(&places, "places")?),
            protocols: split_tags(&text(&protocols, "protocols")?),
            description,
            links: extract_links(&links, loc)?,
            is_unknown: !text(&is_unknown, "?")?.is_empty(),
            line: loc.line,
        })
    }
}

fn split_tags(text: &str) -> BTreeSet<String> {
    text.split_whitespace().map(str::to_string).collect()
}

/// Collect the links of a links cell. Anything besides links and whitespace
/// is an error.
fn extract_links(node: &Markdown, loc: Loc) -> Result<Vec<Link>> {
    let mut links = Vec::new();
    collect_links(node, loc, &mut links)?;
    Ok(links)
}

fn collect_links(node: &Markdown, loc: Loc, links: &mut Vec<Link>) -> Result<()> {
    match node {
        Markdown::Container(children) => {
            for child in children {
                collect_links(child, loc, links)?;
            }
        }
        Markdown::Link(link) => links.push(link.clone()),
        Markdown::Literal(text) => {
            if !text.trim().is_empty() {
                return Err(Error::semantic(
                    loc,
                    format!("non-whitespace text in link list: {text:?}"),
                ));
            }
        }
        Markdown::Code(text) => {
            return Err(Error::semantic(
                loc,
                format!("unexpected inline code in link list: {text:?}"),
            ));
        }
    }
    Ok(())
}
