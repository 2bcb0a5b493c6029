#![doc = r#"
Error taxonomy for the crate.

Only two things are ever fatal: a container whose magic bytes are not
recognised ([`FormatError`]) and a Standard MIDI File whose structure cannot be
read ([`ReaderError`]). Missing data (no embedded MIDI, no protocol markers, no
chord match) is represented with `Option`, and degraded data (unknown root
scheme, unknown JSON fields, truncated chunk streams) is returned as a valid
partial value.
"#]

use crate::reader::ReaderError;
use thiserror::Error;

/// Errors raised while identifying a loop container.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The buffer is shorter than the smallest container header.
    #[error("Buffer of {0} bytes is too short to hold a container header")]
    TooShort(usize),
    /// The first bytes are not `FORM`+`AIFF`/`AIFC` or `caff`.
    #[error("Unrecognized container magic {0:02X?}")]
    UnrecognizedMagic([u8; 4]),
    /// A `FORM` container carried a form type other than `AIFF`/`AIFC`.
    #[error("Unsupported FORM type {0:02X?}")]
    UnsupportedForm([u8; 4]),
}

/// Errors in the structure of a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChunkError {
    /// Expected one tag, found another
    #[error("Expected chunk {expected:?}, found {found:02X?}")]
    UnexpectedTag {
        /// The tag the reader required here
        expected: &'static str,
        /// What was actually in the buffer
        found: [u8; 4],
    },
    /// The declared size extends past the end of the buffer
    #[error("Chunk declares {declared} bytes but only {available} remain")]
    SizeOverflow {
        /// Declared payload size
        declared: u64,
        /// Bytes available after the chunk header
        available: usize,
    },
    /// A second `MThd` chunk.
    #[error("Duplicate header chunk")]
    DuplicateHeader,
    /// The file ended before its header chunk was read.
    #[error("No header chunk")]
    MissingHeader,
}

/// Errors in a Standard MIDI File header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The header chunk is shorter than six bytes.
    #[error("Header length {0} is shorter than 6")]
    Length(u32),
    /// Format word outside 0..=2.
    #[error("Invalid SMF format {0}")]
    InvalidFormat(u16),
    /// SMPTE division is not supported by this codec.
    #[error("SMPTE time division {0:#06X} is not supported")]
    SmpteTiming(u16),
    /// A ticks-per-quarter-note of zero.
    #[error("Ticks per quarter note must be non-zero")]
    ZeroDivision,
}

/// Errors inside an `MTrk` chunk.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackError {
    /// A variable-length quantity longer than four bytes.
    #[error("Variable-length quantity longer than 4 bytes")]
    VlqTooLong,
    /// A data byte appeared with no running status established.
    #[error("Data byte {0:#04X} without running status")]
    NoRunningStatus(u8),
    /// A status byte that cannot start an event.
    #[error("Unexpected status byte {0:#04X}")]
    UnexpectedStatus(u8),
}

/// A parse error from any of the SMF layers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Chunk framing
    #[error("Chunk: {0}")]
    Chunk(#[from] ChunkError),
    /// File header
    #[error("Header: {0}")]
    Header(#[from] HeaderError),
    /// Track body
    #[error("Track: {0}")]
    Track(#[from] TrackError),
}

/// Errors reading or writing the embedded metadata protocol.
///
/// Import never surfaces these: a bad protocol event is logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The text does not carry the protocol prefix.
    #[error("Not a protocol event")]
    NotProtocol,
    /// The JSON body could not be read or written.
    #[error("Protocol JSON: {message}")]
    Json {
        /// What `serde_json` reported
        message: String,
        /// One-based line of the failure, zero when not tied to the input
        line: usize,
        /// One-based column of the failure, zero when not tied to the input
        column: usize,
    },
    /// A `type` this version does not know.
    #[error("Unknown protocol record type {0:?}")]
    UnknownType(String),
}

impl From<serde_json::Error> for ProtocolError {
    fn from(error: serde_json::Error) -> Self {
        Self::Json {
            message: error.to_string(),
            line: error.line(),
            column: error.column(),
        }
    }
}

/// The crate-wide error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The container could not be identified.
    #[error(transparent)]
    Format(#[from] FormatError),
    /// A Standard MIDI File could not be read.
    #[error(transparent)]
    Reader(#[from] ReaderError),
    /// Metadata could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Shorthand for results carrying the crate-wide [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;
