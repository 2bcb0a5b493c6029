use crate::ParseError;
use thiserror::Error;

#[doc = r#"
A set of errors that can occur while reading bytes into one of the crate's
representations.

Every error remembers the absolute offset at which it happened so it can be
checked against the format documentation.
"#]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Reading at Position {position}, {kind}")]
pub struct ReaderError {
    position: usize,
    pub(crate) kind: ReaderErrorKind,
}

/// A kind of error that a reader can produce
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReaderErrorKind {
    /// Parsing errors
    #[error("Parsing {0}")]
    ParseError(#[from] ParseError),
    /// Reading out of bounds.
    #[error("Read out of bounds!")]
    OutOfBounds,
    /// The buffer ended cleanly between two items.
    #[error("End of buffer")]
    Eof,
}

impl ReaderErrorKind {
    /// Shorthand for a chunk framing error.
    pub fn chunk(error: crate::ChunkError) -> Self {
        Self::ParseError(error.into())
    }
    /// Shorthand for a header error.
    pub fn header(error: crate::HeaderError) -> Self {
        Self::ParseError(error.into())
    }
}

impl ReaderError {
    /// Create a reader error from a position and kind
    pub const fn new(position: usize, kind: ReaderErrorKind) -> Self {
        Self { position, kind }
    }
    /// True if out of bounds or unexpected end of file
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(self.kind, ReaderErrorKind::OutOfBounds)
    }
    /// Returns the error kind of the reader.
    pub fn error_kind(&self) -> &ReaderErrorKind {
        &self.kind
    }
    /// Returns the position where the read error occurred.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Create a new invalid data error
    pub fn parse_error(position: usize, error: impl Into<ParseError>) -> Self {
        Self {
            position,
            kind: ReaderErrorKind::ParseError(error.into()),
        }
    }

    /// Create a new out of bounds error
    pub const fn oob(position: usize) -> Self {
        Self {
            position,
            kind: ReaderErrorKind::OutOfBounds,
        }
    }

    /// Create a new end-of-buffer marker
    pub const fn eof(position: usize) -> Self {
        Self {
            position,
            kind: ReaderErrorKind::Eof,
        }
    }
}

/// The Read Result type (see [`ReaderError`])
pub type ReadResult<T> = Result<T, ReaderError>;
