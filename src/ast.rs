use serde::Serialize;
use thiserror::Error;

/// Characters that start or end table and inline syntax inside a cell.
/// A literal containing any of them must escape it to read back the same.
const LITERAL_SPECIALS: &[char] = &['`', '[', ']', '|'];
const CODE_SPECIALS: &[char] = &['`', '|'];
const HREF_SPECIALS: &[char] = &['(', ')', '|'];

/// Rich text from a single table cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Markdown {
    Container(Vec<Markdown>),
    Literal(String),
    Code(String),
    Link(Link),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub label: Box<Markdown>,
    pub href: String,
}

/// Returned by [`Markdown::to_text`] for fragments that have no plain-text form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot convert {0} to text")]
pub struct NotText(pub &'static str);

impl Markdown {
    pub fn literal(text: impl Into<String>) -> Self {
        Markdown::Literal(text.into())
    }

    pub fn code(text: impl Into<String>) -> Self {
        Markdown::Code(text.into())
    }

    pub fn link(label: Markdown, href: impl Into<String>) -> Self {
        Markdown::Link(Link {
            label: Box::new(label),
            href: href.into(),
        })
    }

    /// Plain text of a tree made only of literals.
    pub fn to_text(&self) -> Result<String, NotText> {
        let mut output = String::new();
        self.write_text(&mut output)?;
        Ok(output)
    }

    fn write_text(&self, output: &mut String) -> Result<(), NotText> {
        match self {
            Markdown::Container(children) => {
                for child in children {
                    child.write_text(output)?;
                }
                Ok(())
            }
            Markdown::Literal(text) => {
                output.push_str(text);
                Ok(())
            }
            Markdown::Code(_) => Err(NotText("inline code")),
            Markdown::Link(_) => Err(NotText("link")),
        }
    }

    /// Serialize back to cell Markdown. Parsing the result gives back an
    /// equivalent tree.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        self.write_markdown(&mut output);
        output
    }

    fn write_markdown(&self, output: &mut String) {
        match self {
            Markdown::Container(children) => {
                for child in children {
                    child.write_markdown(output);
                }
            }
            Markdown::Literal(text) => output.push_str(&backslash_escape(text, LITERAL_SPECIALS)),
            Markdown::Code(text) => {
                output.push('`');
                output.push_str(&backslash_escape(text, CODE_SPECIALS));
                output.push('`');
            }
            Markdown::Link(link) => link.write_markdown(output),
        }
    }
}

impl Link {
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();
        self.write_markdown(&mut output);
        output
    }

    fn write_markdown(&self, output: &mut String) {
        output.push('[');
        self.label.write_markdown(output);
        output.push_str("](");
        output.push_str(&backslash_escape(&self.href, HREF_SPECIALS));
        output.push(')');
    }
}

/// Escape `\` and every character of `chars` with a backslash.
///
/// <https://spec.commonmark.org/0.29/#backslash-escapes>
pub fn backslash_escape(s: &str, chars: &[char]) -> String {
    let mut output = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '\\' || chars.contains(&c) {
            output.push('\\');
        }
        output.push(c);
    }
    output
}
