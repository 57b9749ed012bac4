use std::fmt;

/// Token represents a single lexical unit of a timeline document.
/// The tokenizer reads from a stream rather than a buffer, so tokens
/// own their text instead of pointing back into the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub tag: Tag,
    pub text: String,
    pub loc: Loc,
}

impl Token {
    pub fn new(tag: Tag, text: impl Into<String>, loc: Loc) -> Self {
        Token {
            tag,
            text: text.into(),
            loc,
        }
    }
}

/// 1-based position of the first character of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Loc {
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    // Text outside of table syntax
    Literal,

    // Table structure
    RowBegin,
    RowEnd,
    CellEnd,

    // Inline syntax inside cells
    Backtick,
    OpenBracket,
    CloseBracket,
    OpenParen,
    CloseParen,

    // Special
    Eof,
}

impl Tag {
    pub fn symbol(&self) -> &'static str {
        match self {
            Tag::RowBegin | Tag::CellEnd => "|",
            Tag::RowEnd => "\\n",
            Tag::Backtick => "`",
            Tag::OpenBracket => "[",
            Tag::CloseBracket => "]",
            Tag::OpenParen => "(",
            Tag::CloseParen => ")",
            Tag::Eof => "EOF",
            other => other.name(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tag::Literal => "literal",
            Tag::RowBegin => "row_begin",
            Tag::RowEnd => "row_end",
            Tag::CellEnd => "cell_end",
            Tag::Backtick => "backtick",
            Tag::OpenBracket => "open_bracket",
            Tag::CloseBracket => "close_bracket",
            Tag::OpenParen => "open_paren",
            Tag::CloseParen => "close_paren",
            Tag::Eof => "eof",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_symbol() {
        assert_eq!("|", Tag::RowBegin.symbol());
        assert_eq!("`", Tag::Backtick.symbol());
        assert_eq!("literal", Tag::Literal.symbol());
    }

    #[test]
    fn loc_display() {
        let loc = Loc { line: 3, column: 14 };
        assert_eq!("line 3, column 14", loc.to_string());
    }
}
