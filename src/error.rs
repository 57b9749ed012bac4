use std::path::PathBuf;

use thiserror::Error;

use crate::token::Loc;

/// Errors raised while tokenizing, parsing or emitting a timeline document.
///
/// Every malformed-input condition is fatal: the parser stops at the first
/// one and reports where it happened.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid backslash escapes and cells missing their closing `|`.
    #[error("{loc}: {message}")]
    Lex { loc: Loc, message: String },

    /// Header schema, separator row and row shape violations.
    #[error("{loc}: {message}")]
    Structure { loc: Loc, message: String },

    /// Cell contents that do not fit the column they appear in.
    #[error("{loc}: {message}")]
    Semantic { loc: Loc, message: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("CSV error: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    #[error("{}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn lex(loc: Loc, message: impl Into<String>) -> Self {
        Error::Lex {
            loc,
            message: message.into(),
        }
    }

    pub fn structure(loc: Loc, message: impl Into<String>) -> Self {
        Error::Structure {
            loc,
            message: message.into(),
        }
    }

    pub fn semantic(loc: Loc, message: impl Into<String>) -> Self {
        Error::Semantic {
            loc,
            message: message.into(),
        }
    }

    pub fn in_file(self, path: impl Into<PathBuf>) -> Self {
        Error::File {
            path: path.into(),
            source: Box::new(self),
        }
    }

    /// Location of the offending token, if the error came from the input text.
    pub fn loc(&self) -> Option<Loc> {
        match self {
            Error::Lex { loc, .. } | Error::Structure { loc, .. } | Error::Semantic { loc, .. } => {
                Some(*loc)
            }
            Error::File { source, .. } => source.loc(),
            Error::Io { .. } | Error::Csv { .. } | Error::Json { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_errors_keep_inner_location() {
        let loc = Loc { line: 7, column: 2 };
        let err = Error::structure(loc, "bad header").in_file("timeline.md");
        assert_eq!(Some(loc), err.loc());
        assert_eq!("timeline.md: line 7, column 2: bad header", err.to_string());
    }

    #[test]
    fn json_errors_are_not_located() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::Json { .. }), "{err:?}");
        assert_eq!(None, err.loc());
        assert!(err.to_string().starts_with("JSON error: "), "{err}");
    }
}
