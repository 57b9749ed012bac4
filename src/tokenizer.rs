use std::collections::VecDeque;
use std::io::BufRead;

use crate::error::{Error, Result};
use crate::token::{Loc, Tag, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    BeginLine,
    LiteralLine,
    BeginCell,
    InCell,
    Eof,
    Done,
}

/// Line-at-a-time character source with one character of pushback.
struct Reader<R> {
    inner: R,
    chars: Vec<char>,
    index: usize,
    line: u32,
    exhausted: bool,
}

impl<R: BufRead> Reader<R> {
    fn new(inner: R) -> Self {
        Reader {
            inner,
            chars: Vec::new(),
            index: 0,
            line: 0,
            exhausted: false,
        }
    }

    fn get(&mut self) -> Result<Option<char>> {
        if self.index >= self.chars.len() && !self.fill()? {
            return Ok(None);
        }
        let c = self.chars[self.index];
        self.index += 1;
        Ok(Some(c))
    }

    /// Push back the character returned by the last `get`.
    fn unget(&mut self) {
        debug_assert!(self.index > 0, "unget without a preceding get");
        self.index -= 1;
    }

    fn fill(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        let mut line = String::new();
        if self.inner.read_line(&mut line)? == 0 {
            self.exhausted = true;
            return Ok(false);
        }
        // CRLF line endings read the same as LF.
        if line.ends_with("\r\n") {
            line.truncate(line.len() - 2);
            line.push('\n');
        }
        self.chars = line.chars().collect();
        self.index = 0;
        self.line += 1;
        Ok(true)
    }

    /// Location of the next character `get` would return.
    fn loc(&self) -> Loc {
        if self.index < self.chars.len() {
            return Loc {
                line: self.line,
                column: self.index as u32 + 1,
            };
        }
        match self.chars.last() {
            Some('\n') | None => Loc {
                line: self.line + 1,
                column: 1,
            },
            Some(_) => Loc {
                line: self.line,
                column: self.chars.len() as u32 + 1,
            },
        }
    }
}

/// Splits a timeline document into table-syntax tokens.
///
/// Lines that do not start with `|` become literal text. Inside a table row,
/// `|` ends a cell, backslash escapes are resolved, and the inline syntax
/// characters `` ` `` `[` `]` `(` `)` get their own tokens. Adjacent literal
/// characters are coalesced into one token.
///
/// The iterator yields exactly one `Eof` token at the end of input and stops
/// after the first error.
pub struct Tokenizer<R> {
    reader: Reader<R>,
    state: State,
    literal: String,
    literal_loc: Loc,
    pending: VecDeque<Token>,
}

impl<R: BufRead> Tokenizer<R> {
    pub fn new(reader: R) -> Self {
        Tokenizer {
            reader: Reader::new(reader),
            state: State::BeginLine,
            literal: String::new(),
            literal_loc: Loc::default(),
            pending: VecDeque::new(),
        }
    }

    fn step(&mut self) -> Result<()> {
        let loc = self.reader.loc();

        match self.state {
            State::BeginLine => match self.reader.get()? {
                None => self.state = State::Eof,
                Some('|') => {
                    self.emit(Tag::RowBegin, "|", loc);
                    self.state = State::BeginCell;
                }
                Some(_) => {
                    self.reader.unget();
                    self.state = State::LiteralLine;
                }
            },
            State::LiteralLine => match self.reader.get()? {
                None => self.state = State::BeginLine,
                Some(c) => {
                    self.push_literal(c, loc);
                    if c == '\n' {
                        self.state = State::BeginLine;
                    }
                }
            },
            State::BeginCell => match self.reader.get()? {
                None => {
                    self.emit(Tag::RowEnd, "", loc);
                    self.state = State::BeginLine;
                }
                Some('\n') => {
                    self.emit(Tag::RowEnd, "\n", loc);
                    self.state = State::BeginLine;
                }
                Some(_) => {
                    self.reader.unget();
                    self.state = State::InCell;
                }
            },
            State::InCell => self.step_cell(loc)?,
            State::Eof => {
                self.emit(Tag::Eof, "", loc);
                self.state = State::Done;
            }
            State::Done => {}
        }

        Ok(())
    }

    fn step_cell(&mut self, loc: Loc) -> Result<()> {
        let Some(c) = self.reader.get()? else {
            return Err(Error::lex(loc, "expected '|' at end of table row"));
        };

        match c {
            '\n' => return Err(Error::lex(loc, "expected '|' at end of table row")),
            '|' => {
                self.emit(Tag::CellEnd, "|", loc);
                self.state = State::BeginCell;
            }
            // https://spec.commonmark.org/0.29/#backslash-escapes
            '\\' => match self.reader.get()? {
                Some(d) if d.is_ascii_punctuation() => self.push_literal(d, loc),
                None | Some('\n') => {
                    return Err(Error::lex(loc, "backslash at end of a line is not supported"));
                }
                Some(d) => {
                    return Err(Error::lex(
                        loc,
                        format!("invalid backslash escape '\\{d}'"),
                    ));
                }
            },
            '`' => self.emit(Tag::Backtick, "`", loc),
            '[' => self.emit(Tag::OpenBracket, "[", loc),
            ']' => self.emit(Tag::CloseBracket, "]", loc),
            '(' => self.emit(Tag::OpenParen, "(", loc),
            ')' => self.emit(Tag::CloseParen, ")", loc),
            other => self.push_literal(other, loc),
        }

        Ok(())
    }

    fn push_literal(&mut self, c: char, loc: Loc) {
        if self.literal.is_empty() {
            self.literal_loc = loc;
        }
        self.literal.push(c);
    }

    fn emit(&mut self, tag: Tag, text: &str, loc: Loc) {
        self.flush_literal();
        self.pending.push_back(Token::new(tag, text, loc));
    }

    fn flush_literal(&mut self) {
        if !self.literal.is_empty() {
            let text = std::mem::take(&mut self.literal);
            self.pending
                .push_back(Token::new(Tag::Literal, text, self.literal_loc));
        }
    }
}

impl<R: BufRead> Iterator for Tokenizer<R> {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(tok) = self.pending.pop_front() {
                return Some(Ok(tok));
            }
            if self.state == State::Done {
                return None;
            }
            if let Err(err) = self.step() {
                self.state = State::Done;
                self.literal.clear();
                return Some(Err(err));
            }
        }
    }
}

/// Tokenize a whole in-memory document.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    Tokenizer::new(source.as_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(source: &str) -> Vec<Tag> {
        tokenize(source).unwrap().iter().map(|t| t.tag).collect()
    }

    #[test]
    fn tokenize_table_row() {
        let tokens = tokenize("| a | [b](c) |\n").unwrap();
        let tags: Vec<Tag> = tokens.iter().map(|t| t.tag).collect();
        assert_eq!(
            vec![
                Tag::RowBegin,
                Tag::Literal,
                Tag::CellEnd,
                Tag::Literal,
                Tag::OpenBracket,
                Tag::Literal,
                Tag::CloseBracket,
                Tag::OpenParen,
                Tag::Literal,
                Tag::CloseParen,
                Tag::Literal,
                Tag::CellEnd,
                Tag::RowEnd,
                Tag::Eof,
            ],
            tags
        );
        assert_eq!(" a ", tokens[1].text);
        assert_eq!("\n", tokens[12].text);
    }

    #[test]
    fn literal_lines_are_coalesced() {
        let tokens = tokenize("# Title\n\nSome text\n").unwrap();
        assert_eq!(2, tokens.len());
        assert_eq!(Tag::Literal, tokens[0].tag);
        assert_eq!("# Title\n\nSome text\n", tokens[0].text);
        assert_eq!(Tag::Eof, tokens[1].tag);
    }

    #[test]
    fn row_without_trailing_newline_ends_at_eof() {
        assert_eq!(
            vec![Tag::RowBegin, Tag::Literal, Tag::CellEnd, Tag::RowEnd, Tag::Eof],
            tags("| x |")
        );
    }

    #[test]
    fn escaped_pipe_is_literal() {
        let tokens = tokenize("| a \\| b |\n").unwrap();
        assert_eq!(Tag::Literal, tokens[1].tag);
        assert_eq!(" a | b ", tokens[1].text);
        assert_eq!(Tag::CellEnd, tokens[2].tag);
    }

    #[test]
    fn escaped_brackets_are_literal() {
        let tokens = tokenize("|\\[x\\]\\`|\n").unwrap();
        assert_eq!(Tag::Literal, tokens[1].tag);
        assert_eq!("[x]`", tokens[1].text);
    }

    #[test]
    fn invalid_escape_is_fatal() {
        let err = tokenize("| \\d |\n").unwrap_err();
        assert!(matches!(err, Error::Lex { .. }), "{err:?}");
        assert_eq!(Some(Loc { line: 1, column: 3 }), err.loc());
    }

    #[test]
    fn backslash_at_end_of_line_is_fatal() {
        assert!(matches!(tokenize("| a\\\n"), Err(Error::Lex { .. })));
    }

    #[test]
    fn unterminated_cell_is_fatal() {
        let err = tokenize("text\n| a | b\n").unwrap_err();
        assert!(matches!(err, Error::Lex { .. }));
        assert_eq!(Some(Loc { line: 2, column: 8 }), err.loc());
    }

    #[test]
    fn stops_after_error() {
        let mut tokenizer = Tokenizer::new("| a\n| b |\n".as_bytes());
        assert_eq!(Tag::RowBegin, tokenizer.next().unwrap().unwrap().tag);
        assert!(tokenizer.next().unwrap().is_err());
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn crlf_line_endings_are_newlines() {
        let tokens = tokenize("intro\r\n| a |\r\n").unwrap();
        assert_eq!("intro\n", tokens[0].text);
        assert_eq!(
            vec![Tag::Literal, Tag::RowBegin, Tag::Literal, Tag::CellEnd, Tag::RowEnd, Tag::Eof],
            tokens.iter().map(|t| t.tag).collect::<Vec<_>>()
        );
        assert_eq!("\n", tokens[4].text);
    }

    #[test]
    fn empty_input_is_just_eof() {
        assert_eq!(vec![Tag::Eof], tags(""));
    }

    #[test]
    fn tokens_carry_locations() {
        let tokens = tokenize("intro\n|a|\n").unwrap();
        assert_eq!(Loc { line: 1, column: 1 }, tokens[0].loc);
        assert_eq!(Loc { line: 2, column: 1 }, tokens[1].loc);
        assert_eq!(Loc { line: 2, column: 2 }, tokens[2].loc);
        assert_eq!(Loc { line: 2, column: 3 }, tokens[3].loc);
    }
}
