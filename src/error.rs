//! Error taxonomy for the translator (spec.md §7).
use rustpython_parser::text_size::TextRange;
use std::fmt;

/// 1-based line/column derived from a byte range against the original source.
/// Computed lazily, only when an error is actually being constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

impl Location {
    pub fn from_range(source: &str, range: TextRange) -> Self {
        let offset: usize = range.start().into();
        let mut line = 1usize;
        let mut col = 1usize;
        for (i, ch) in source.char_indices() {
            if i >= offset {
                break;
            }
            if ch == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Location { line, column: col }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] rustpython_parser::ParseError),

    #[error("{at}: unrecognised pattern: expected {expected}, found {found}")]
    UnrecognisedPattern {
        at: Location,
        expected: &'static str,
        found: String,
    },

    #[error("{at}: compound literal used where no contextual type is available")]
    MissingContext { at: Location },

    #[error("{at}: annotation mismatch: {detail}")]
    AnnotationMismatch { at: Location, detail: String },

    #[error("{at}: reserved identifier misused: {detail}")]
    ReservedMisuse { at: Location, detail: String },

    #[error("{at}: unknown decorator `{name}`")]
    UnknownDecorator { at: Location, name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
