#![doc = r#"
Length-prefixed chunk sequences.

# Overview

Both loop containers are a flat run of chunks, each identified by a 4-character
ASCII tag followed by a big-endian size and then the chunk data:

```text
AIFF: tag(4) size:u32 data(size) [pad byte if size is odd]
CAF:  tag(4) size:u64 data(size)
```

The walker is deliberately forgiving. On the first structural violation it stops
and hands back everything parsed so far, so a valid prefix of a truncated or
badly-encoded file is still usable.
"#]

use crate::{
    ChunkError,
    config::NestedTag,
    reader::{ReadResult, Reader, ReaderError},
};

/// How a container encodes chunk sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeWidth {
    /// 32-bit sizes, data padded to an even length (AIFF/AIFC).
    U32Padded,
    /// 64-bit sizes, no padding (CAF).
    U64,
}

/// One tagged block of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk<'a> {
    id: [u8; 4],
    data: &'a [u8],
    offset: usize,
    depth: usize,
}

impl<'a> Chunk<'a> {
    /// The four-byte tag.
    pub const fn id(&self) -> [u8; 4] {
        self.id
    }
    /// The tag as text, with non-ASCII bytes replaced.
    pub fn tag(&self) -> String {
        String::from_utf8_lossy(&self.id).into_owned()
    }
    /// The chunk payload, excluding header and pad byte.
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }
    /// Absolute offset of the chunk header within the walked buffer.
    pub const fn offset(&self) -> usize {
        self.offset
    }
    /// Absolute offset of the first payload byte.
    pub const fn data_offset(&self, width: SizeWidth) -> usize {
        self.offset
            + 4
            + match width {
                SizeWidth::U32Padded => 4,
                SizeWidth::U64 => 8,
            }
    }
    /// 0 for top-level chunks, incremented for each nested container.
    pub const fn depth(&self) -> usize {
        self.depth
    }
    /// True if the tag equals `id`.
    pub fn is(&self, id: &[u8; 4]) -> bool {
        &self.id == id
    }
}

fn read_chunk<'a>(
    reader: &mut Reader<'a>,
    width: SizeWidth,
    depth: usize,
) -> ReadResult<Chunk<'a>> {
    let offset = reader.buffer_position();
    let id = reader.read_exact_size::<4>()?;
    let declared = match width {
        SizeWidth::U32Padded => u64::from(reader.read_u32_be()?),
        SizeWidth::U64 => reader.read_u64_be()?,
    };
    let available = reader.remaining();

    // CAF allows the final audio chunk to declare -1 and run to the end.
    let size = if width == SizeWidth::U64 && declared == u64::MAX {
        available
    } else {
        usize::try_from(declared)
            .ok()
            .filter(|size| *size <= available)
            .ok_or_else(|| {
                ReaderError::parse_error(
                    offset,
                    ChunkError::SizeOverflow {
                        declared,
                        available,
                    },
                )
            })?
    };

    let data = reader.read_slice(size)?;
    if width == SizeWidth::U32Padded && size % 2 == 1 && !reader.is_empty() {
        reader.skip(1)?;
    }
    Ok(Chunk {
        id,
        data,
        offset,
        depth,
    })
}

/// Walks the chunk sequence of `buf` starting at `start`.
///
/// Never fails: a header that does not fit, or a size pointing past the end of
/// the buffer, ends the walk and the chunks decoded so far are returned.
pub fn walk_chunks(buf: &[u8], start: usize, width: SizeWidth) -> Vec<Chunk<'_>> {
    walk_at_depth(buf, start, width, 0)
}

fn walk_at_depth(buf: &[u8], start: usize, width: SizeWidth, depth: usize) -> Vec<Chunk<'_>> {
    let mut reader = Reader::at(buf, start);
    let mut chunks = Vec::new();
    while !reader.is_empty() {
        match read_chunk(&mut reader, width, depth) {
            Ok(chunk) => chunks.push(chunk),
            Err(e) => {
                tracing::warn!(
                    offset = e.position(),
                    parsed = chunks.len(),
                    "chunk stream ended early: {e}"
                );
                break;
            }
        }
    }
    chunks
}

/// Walks `buf` like [`walk_chunks`], descending into nested containers.
///
/// The result is in pre-order: each nested container is immediately followed by
/// its children. Child offsets remain absolute within `buf`.
pub fn walk_chunks_recursive<'a>(
    buf: &'a [u8],
    start: usize,
    width: SizeWidth,
    nested: &[NestedTag],
) -> Vec<Chunk<'a>> {
    let mut out = Vec::new();
    descend(buf, start, width, nested, 0, &mut out);
    out
}

const MAX_DEPTH: usize = 8;

fn descend<'a>(
    buf: &'a [u8],
    start: usize,
    width: SizeWidth,
    nested: &[NestedTag],
    depth: usize,
    out: &mut Vec<Chunk<'a>>,
) {
    for chunk in walk_at_depth(buf, start, width, depth) {
        out.push(chunk);
        if depth >= MAX_DEPTH {
            continue;
        }
        let Some(tag) = nested.iter().find(|n| chunk.is(&n.tag)) else {
            continue;
        };
        if chunk.data().len() <= tag.prefix_len {
            continue;
        }
        let child_start = chunk.data_offset(width) + tag.prefix_len;
        let child_end = chunk.data_offset(width) + chunk.data().len();
        tracing::trace!(tag = %chunk.tag(), child_start, "descending into nested chunk");
        descend(
            &buf[..child_end],
            child_start,
            width,
            nested,
            depth + 1,
            out,
        );
    }
}

#[cfg(test)]
fn aiff_chunk(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(0);
    }
    out
}

#[test]
fn odd_sized_chunks_are_padded() {
    use pretty_assertions::assert_eq;
    let mut buf = aiff_chunk(b"NAME", b"abc");
    buf.extend(aiff_chunk(b"ANNO", b"hi"));
    let chunks = walk_chunks(&buf, 0, SizeWidth::U32Padded);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0].data(), b"abc");
    assert_eq!(chunks[1].offset(), 12);
    assert_eq!(chunks[1].data(), b"hi");
}

#[test]
fn caf_sizes_are_64_bit_and_unpadded() {
    let mut buf = b"desc".to_vec();
    buf.extend_from_slice(&3u64.to_be_bytes());
    buf.extend_from_slice(b"xyz");
    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&u64::MAX.to_be_bytes());
    buf.extend_from_slice(b"rest of file");
    let chunks = walk_chunks(&buf, 0, SizeWidth::U64);
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1].offset(), 15);
    assert_eq!(chunks[1].data(), b"rest of file");
}

#[test]
fn truncated_stream_keeps_prefix() {
    let mut buf = aiff_chunk(b"COMM", &[1, 2, 3, 4]);
    buf.extend_from_slice(b"SSND");
    buf.extend_from_slice(&1000u32.to_be_bytes());
    buf.extend_from_slice(&[0; 10]);
    let chunks = walk_chunks(&buf, 0, SizeWidth::U32Padded);
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].is(b"COMM"));
}

#[test]
fn nested_application_chunks_are_walked() {
    use pretty_assertions::assert_eq;
    let mut inner = b"sig!".to_vec();
    inner.extend(aiff_chunk(b"Sequ", &[7; 6]));
    let mut buf = aiff_chunk(b"APPL", &inner);
    buf.extend(aiff_chunk(b"MARK", &[0; 2]));
    let chunks = walk_chunks_recursive(
        &buf,
        0,
        SizeWidth::U32Padded,
        &[NestedTag {
            tag: *b"APPL",
            prefix_len: 4,
        }],
    );
    let tags: Vec<String> = chunks.iter().map(Chunk::tag).collect();
    assert_eq!(tags, ["APPL", "Sequ", "MARK"]);
    assert_eq!(chunks[1].depth(), 1);
    assert_eq!(chunks[1].offset(), 12);
    assert_eq!(chunks[1].data(), &[7; 6]);
}
