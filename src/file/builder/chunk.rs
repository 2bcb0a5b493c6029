#![doc = r#"
Chunk framing of a Standard MIDI File.

```text
[Header Chunk: "MThd"]
[Track Chunk 1: "MTrk"]
...
[Track Chunk N: "MTrk"]
[Optional Unknown Chunks]
```

Each chunk is a four-byte ASCII tag, a big-endian 32-bit length and that many
bytes of data. Anything other than `MThd` and `MTrk` is surfaced as an
[`UnknownChunk`] so the caller can decide whether it matters.
"#]

use crate::{
    ChunkError,
    reader::{ReadResult, Reader, ReaderError},
};

/// An unrecognised chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownChunk<'a> {
    id: [u8; 4],
    data: &'a [u8],
}

impl<'a> UnknownChunk<'a> {
    /// The four-byte tag
    pub const fn id(&self) -> [u8; 4] {
        self.id
    }
    /// The chunk data
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }
}

/// One chunk read from the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkEvent<'a> {
    /// `MThd` data and its absolute offset
    Header(&'a [u8], usize),
    /// `MTrk` data and its absolute offset
    Track(&'a [u8], usize),
    /// Anything else
    Unknown(UnknownChunk<'a>),
    /// The buffer is exhausted
    Eof,
}

impl ChunkEvent<'_> {
    /// True once nothing is left to read.
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::Eof)
    }
}

/// How a declared chunk length that runs past the buffer is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// The overrun is an error.
    #[default]
    Strict,
    /// The chunk is cut to the bytes that remain. Files embedded in loop
    /// containers often declare a track a few bytes longer than it is.
    Clamped,
}

/// Reads the next chunk.
///
/// Under [`Framing::Strict`] a declared length that runs past the buffer is an
/// error: a standalone MIDI file has no partial result worth keeping from a
/// broken track.
pub fn read_chunk<'a>(reader: &mut Reader<'a>, framing: Framing) -> ReadResult<ChunkEvent<'a>> {
    if reader.is_empty() {
        return Ok(ChunkEvent::Eof);
    }
    let id: [u8; 4] = reader.read_exact_size()?;
    let declared = reader.read_u32_be()? as usize;
    let offset = reader.buffer_position();
    let len = if declared <= reader.remaining() {
        declared
    } else if framing == Framing::Clamped {
        tracing::warn!(
            id = %String::from_utf8_lossy(&id),
            declared,
            available = reader.remaining(),
            "chunk length runs past the buffer, clamping"
        );
        reader.remaining()
    } else {
        return Err(ReaderError::parse_error(
            offset - 4,
            ChunkError::SizeOverflow {
                declared: declared as u64,
                available: reader.remaining(),
            },
        ));
    };
    let data = reader.read_slice(len)?;
    Ok(match &id {
        b"MThd" => ChunkEvent::Header(data, offset),
        b"MTrk" => ChunkEvent::Track(data, offset),
        _ => ChunkEvent::Unknown(UnknownChunk { id, data }),
    })
}

#[test]
fn chunks_are_framed_by_length() {
    let bytes = [
        b'M', b'T', b'r', b'k', 0, 0, 0, 2, 0xAA, 0xBB, b'X', b'Y', b'Z', b'!', 0, 0, 0, 0,
    ];
    let mut reader = Reader::from_byte_slice(&bytes);
    assert_eq!(
        read_chunk(&mut reader, Framing::Strict).unwrap(),
        ChunkEvent::Track(&[0xAA, 0xBB], 8)
    );
    assert!(matches!(
        read_chunk(&mut reader, Framing::Strict).unwrap(),
        ChunkEvent::Unknown(c) if &c.id() == b"XYZ!" && c.data().is_empty()
    ));
    assert!(read_chunk(&mut reader, Framing::Strict).unwrap().is_eof());
}

#[test]
fn overlong_chunks_are_rejected() {
    let bytes = [b'M', b'T', b'r', b'k', 0, 0, 0, 9, 0xAA];
    let err = read_chunk(&mut Reader::from_byte_slice(&bytes), Framing::Strict).unwrap_err();
    assert_eq!(err.position(), 4);
}

#[test]
fn overlong_chunks_are_clamped_on_request() {
    let bytes = [b'M', b'T', b'r', b'k', 0, 0, 0, 9, 0xAA];
    let mut reader = Reader::from_byte_slice(&bytes);
    assert_eq!(
        read_chunk(&mut reader, Framing::Clamped).unwrap(),
        ChunkEvent::Track(&[0xAA], 8)
    );
    assert!(read_chunk(&mut reader, Framing::Clamped).unwrap().is_eof());
}
