use std::io::BufRead;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::ast::{Markdown, NotText};
use crate::entry::{EXPECTED_COLUMN_NAMES, Entry};
use crate::error::{Error, Result};
use crate::token::{Loc, Tag, Token};
use crate::tokenizer::Tokenizer;

// https://docs.gitlab.com/ee/user/markdown.html#tables
// The separator row needs three or more dashes per column, with optional
// colons on either side for alignment.
static SEPARATOR_CELL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:?-{3,}:?$").expect("separator pattern is valid"));

/// A top-level piece of a timeline document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Item {
    /// Verbatim text between tables.
    Text { text: String },
    /// One table, as its parsed rows.
    Table { entries: Vec<Entry> },
}

/// Pulls tokens from a [`Tokenizer`] and yields text spans and tables.
///
/// Parsing is lazy: each call to `next` reads only as far as the end of the
/// next item. The first error ends the sequence.
pub struct Parser<R> {
    tokens: Tokenizer<R>,
    unread: Option<Token>,
    last_loc: Loc,
    done: bool,
}

impl<R: BufRead> Parser<R> {
    pub fn new(reader: R) -> Self {
        Parser {
            tokens: Tokenizer::new(reader),
            unread: None,
            last_loc: Loc::default(),
            done: false,
        }
    }

    // === Token consumption methods ===

    fn read_token(&mut self) -> Result<Token> {
        if let Some(token) = self.unread.take() {
            return Ok(token);
        }
        match self.tokens.next() {
            Some(token) => {
                let token = token?;
                self.last_loc = token.loc;
                Ok(token)
            }
            None => Ok(Token::new(Tag::Eof, "", self.last_loc)),
        }
    }

    fn unread_token(&mut self, token: Token) {
        debug_assert!(self.unread.is_none(), "only one token of pushback");
        self.unread = Some(token);
    }

    // === Grammar ===

    fn parse_item(&mut self) -> Result<Option<Item>> {
        let token = self.read_token()?;
        match token.tag {
            Tag::Eof => Ok(None),
            Tag::Literal => {
                log::trace!("text span at {}", token.loc);
                Ok(Some(Item::Text { text: token.text }))
            }
            Tag::RowBegin => {
                let entries = self.parse_table(token.loc)?;
                Ok(Some(Item::Table { entries }))
            }
            other => Err(Error::structure(
                token.loc,
                format!("unexpected `{}` outside of a table", other.symbol()),
            )),
        }
    }

    /// Parse a table whose header row's leading `|` was just read.
    fn parse_table(&mut self, loc: Loc) -> Result<Vec<Entry>> {
        let header = self.parse_table_row()?;
        let column_names = cell_texts(&header).map_err(|err| {
            Error::structure(loc, format!("table header: {err}"))
        })?;
        if !column_names.iter().map(String::as_str).eq(EXPECTED_COLUMN_NAMES) {
            return Err(Error::structure(
                loc,
                format!(
                    "unexpected table columns {column_names:?}, expected {EXPECTED_COLUMN_NAMES:?}"
                ),
            ));
        }

        let token = self.read_token()?;
        if token.tag != Tag::RowBegin {
            return Err(Error::structure(
                token.loc,
                "expected separator row after table header",
            ));
        }
        let separator = self.parse_table_row()?;
        let separator = cell_texts(&separator).map_err(|err| {
            Error::structure(token.loc, format!("table separator: {err}"))
        })?;
        if separator.len() != column_names.len() {
            return Err(Error::structure(
                token.loc,
                format!(
                    "separator row has {} cells, header has {}",
                    separator.len(),
                    column_names.len()
                ),
            ));
        }
        if let Some(bad) = separator.iter().find(|cell| !is_separator_cell(cell)) {
            return Err(Error::structure(
                token.loc,
                format!("malformed separator cell {bad:?}"),
            ));
        }

        let mut entries = Vec::new();
        loop {
            let token = self.read_token()?;
            if token.tag != Tag::RowBegin {
                self.unread_token(token);
                break;
            }
            let row = self.parse_table_row()?;
            entries.push(Entry::from_row(row, token.loc)?);
        }

        log::debug!("parsed table at {} with {} entries", loc, entries.len());
        Ok(entries)
    }

    fn parse_table_row(&mut self) -> Result<Vec<Markdown>> {
        let mut cells = Vec::new();
        loop {
            let token = self.read_token()?;
            if token.tag == Tag::RowEnd {
                break;
            }
            self.unread_token(token);
            cells.push(self.parse_table_cell()?);
        }
        Ok(cells)
    }

    fn parse_table_cell(&mut self) -> Result<Markdown> {
        let mut children = Vec::new();
        loop {
            let token = self.read_token()?;
            match token.tag {
                Tag::CellEnd => break,
                Tag::Backtick => children.push(self.parse_code()?),
                Tag::OpenBracket => children.push(self.parse_link()?),
                // A stray `]`, `(` or `)` is just text here.
                Tag::Literal | Tag::CloseBracket | Tag::OpenParen | Tag::CloseParen => {
                    children.push(Markdown::Literal(token.text))
                }
                Tag::RowBegin | Tag::RowEnd | Tag::Eof => {
                    return Err(Error::structure(
                        token.loc,
                        format!("unexpected `{}` in table cell", token.tag.symbol()),
                    ));
                }
            }
        }
        Ok(Markdown::Container(children))
    }

    /// Parse an inline code span whose opening backtick was just read.
    fn parse_code(&mut self) -> Result<Markdown> {
        let mut text = String::new();
        loop {
            let token = self.read_token()?;
            match token.tag {
                Tag::Backtick => break,
                Tag::Literal
                | Tag::OpenBracket
                | Tag::CloseBracket
                | Tag::OpenParen
                | Tag::CloseParen => text.push_str(&token.text),
                other => {
                    return Err(Error::semantic(
                        token.loc,
                        format!("unexpected `{}` in inline code", other.symbol()),
                    ));
                }
            }
        }
        Ok(Markdown::Code(text))
    }

    /// Parse what follows an opening `[`. Returns a link, or the bracketed
    /// text as literals when there is no `(href)` after the `]`.
    fn parse_link(&mut self) -> Result<Markdown> {
        let mut label = Vec::new();
        loop {
            let token = self.read_token()?;
            match token.tag {
                Tag::CloseBracket => break,
                Tag::OpenBracket => {
                    // Another `[` before any `]`: the first one was plain text.
                    self.unread_token(token);
                    label.insert(0, Markdown::literal("["));
                    return Ok(Markdown::Container(label));
                }
                Tag::Literal | Tag::OpenParen | Tag::CloseParen => {
                    label.push(Markdown::Literal(token.text))
                }
                Tag::Backtick => label.push(self.parse_code()?),
                other => {
                    return Err(Error::semantic(
                        token.loc,
                        format!("unexpected `{}` in link label", other.symbol()),
                    ));
                }
            }
        }

        let token = self.read_token()?;
        if token.tag != Tag::OpenParen {
            self.unread_token(token);
            label.insert(0, Markdown::literal("["));
            label.push(Markdown::literal("]"));
            return Ok(Markdown::Container(label));
        }

        let mut href = String::new();
        loop {
            let token = self.read_token()?;
            match token.tag {
                Tag::CloseParen => break,
                Tag::Literal | Tag::Backtick | Tag::OpenBracket | Tag::CloseBracket => {
                    href.push_str(&token.text)
                }
                other => {
                    return Err(Error::semantic(
                        token.loc,
                        format!("unexpected `{}` in link href", other.symbol()),
                    ));
                }
            }
        }
        Ok(Markdown::link(Markdown::Container(label), href))
    }
}

impl<R: BufRead> Iterator for Parser<R> {
    type Item = Result<Item>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.parse_item() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

fn cell_texts(cells: &[Markdown]) -> std::result::Result<Vec<String>, NotText> {
    cells
        .iter()
        .map(|cell| cell.to_text().map(|text| text.trim().to_string()))
        .collect()
}

/// Whether a trimmed cell is a valid header separator like `---` or `:---:`.
pub fn is_separator_cell(text: &str) -> bool {
    SEPARATOR_CELL.is_match(text.trim())
}

/// Parse a whole in-memory document.
pub fn parse(source: &str) -> Result<Vec<Item>> {
    Parser::new(source.as_bytes()).collect()
}

/// Parse a document and return the entries of all its tables, in order.
pub fn parse_entries(source: &str) -> Result<Vec<Entry>> {
    let mut entries = Vec::new();
    for item in Parser::new(source.as_bytes()) {
        if let Item::Table { entries: table } = item? {
            entries.extend(table);
        }
    }
    Ok(entries)
}

/// Parse the Markdown of a single table cell, without the surrounding pipes.
pub fn parse_cell(source: &str) -> Result<Markdown> {
    let row = format!("|{source}|\n");
    let mut parser = Parser::new(row.as_bytes());
    let token = parser.read_token()?;
    if token.tag != Tag::RowBegin {
        return Err(Error::structure(token.loc, "expected a table cell"));
    }
    let mut cells = parser.parse_table_row()?;
    if cells.len() != 1 {
        return Err(Error::structure(
            token.loc,
            format!("expected a single table cell, found {}", cells.len()),
        ));
    }
    Ok(cells.remove(0))
}
