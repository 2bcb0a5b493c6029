#![doc = r#"
Loop containers: AIFF/AIFC (`FORM`) and Core Audio Format (`caff`).

A container is identified by its magic bytes, then walked into a flat,
pre-ordered list of [`Chunk`]s. Two products are pulled out of it for the
import pipeline: the embedded Standard MIDI File bytes and the payloads that
carry chord-annotation records.

```text
FORM <size:u32> AIFF|AIFC  chunk*      (32-bit sizes, even padding)
caff <version:u16> <flags:u16> chunk*  (64-bit sizes)
```
"#]

mod chunk;
pub use chunk::*;

use crate::{FormatError, config::DecodeConfig};

/// The MIDI file-header magic.
pub const SMF_MAGIC: &[u8; 4] = b"MThd";

/// Which container family a buffer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// `FORM`/`AIFF`
    Aiff,
    /// `FORM`/`AIFC`
    Aifc,
    /// `caff`
    Caf,
}

impl ContainerKind {
    /// Identify the container from its leading bytes.
    ///
    /// # Errors
    /// [`FormatError`] if the magic bytes are not recognised. There is no
    /// partial result for an unknown container.
    pub fn detect(bytes: &[u8]) -> Result<Self, FormatError> {
        let magic: [u8; 4] = bytes
            .get(..4)
            .and_then(|m| m.try_into().ok())
            .ok_or(FormatError::TooShort(bytes.len()))?;
        match &magic {
            b"FORM" => {
                let form: [u8; 4] = bytes
                    .get(8..12)
                    .and_then(|m| m.try_into().ok())
                    .ok_or(FormatError::TooShort(bytes.len()))?;
                match &form {
                    b"AIFF" => Ok(Self::Aiff),
                    b"AIFC" => Ok(Self::Aifc),
                    _ => Err(FormatError::UnsupportedForm(form)),
                }
            }
            b"caff" => {
                if bytes.len() < 8 {
                    return Err(FormatError::TooShort(bytes.len()));
                }
                Ok(Self::Caf)
            }
            _ => Err(FormatError::UnrecognizedMagic(magic)),
        }
    }

    /// Offset of the first chunk header.
    pub const fn first_chunk_offset(&self) -> usize {
        match self {
            Self::Aiff | Self::Aifc => 12,
            Self::Caf => 8,
        }
    }

    /// How chunk sizes are encoded.
    pub const fn size_width(&self) -> SizeWidth {
        match self {
            Self::Aiff | Self::Aifc => SizeWidth::U32Padded,
            Self::Caf => SizeWidth::U64,
        }
    }
}

/// Where the embedded MIDI bytes were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiSource {
    /// Payload of a chunk with a MIDI tag.
    Chunk {
        /// The chunk tag
        id: [u8; 4],
    },
    /// Found by scanning the whole buffer for the `MThd` magic.
    MagicScan,
}

/// A Standard MIDI File found inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedMidi<'a> {
    /// The bytes, starting at `MThd`.
    pub bytes: &'a [u8],
    /// Absolute offset of `bytes` in the container.
    pub offset: usize,
    /// How it was located.
    pub source: MidiSource,
}

/// A walked loop container.
#[derive(Debug, Clone)]
pub struct LoopContainer<'a> {
    kind: ContainerKind,
    bytes: &'a [u8],
    chunks: Vec<Chunk<'a>>,
}

impl<'a> LoopContainer<'a> {
    /// Identify and walk a container.
    ///
    /// # Errors
    /// Only when the magic bytes are unrecognised; a damaged chunk stream
    /// yields the chunks before the damage.
    pub fn parse(bytes: &'a [u8], config: &DecodeConfig) -> Result<Self, FormatError> {
        let kind = ContainerKind::detect(bytes)?;
        let chunks = walk_chunks_recursive(
            bytes,
            kind.first_chunk_offset(),
            kind.size_width(),
            &config.nested_tags,
        );
        tracing::debug!(?kind, chunks = chunks.len(), "walked loop container");
        Ok(Self {
            kind,
            bytes,
            chunks,
        })
    }

    /// The container family.
    pub const fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// All chunks, nested ones included, in pre-order.
    pub fn chunks(&self) -> &[Chunk<'a>] {
        &self.chunks
    }

    /// The first chunk tagged `id`, at any depth.
    pub fn find(&self, id: &[u8; 4]) -> Option<&Chunk<'a>> {
        self.chunks.iter().find(|c| c.is(id))
    }

    /// Chunks whose payloads may hold chord-annotation records.
    pub fn annotation_chunks<'s>(
        &'s self,
        config: &'s DecodeConfig,
    ) -> impl Iterator<Item = &'s Chunk<'a>> + 's {
        self.chunks
            .iter()
            .filter(|c| config.annotation_tags.contains(&c.id()))
    }

    /// Locate the embedded Standard MIDI File.
    ///
    /// Tagged chunks are tried first. Failing that, the whole buffer is scanned
    /// for `MThd` and everything from there to the end of the buffer is
    /// returned, since third-party encoders do not always declare the
    /// embedded length correctly.
    pub fn embedded_midi(&self, config: &DecodeConfig) -> Option<EmbeddedMidi<'a>> {
        let width = self.kind.size_width();
        for chunk in &self.chunks {
            if !config.midi_tags.contains(&chunk.id()) {
                continue;
            }
            let data = chunk.data();
            if let Some(at) = find_magic(data) {
                return Some(EmbeddedMidi {
                    bytes: &data[at..],
                    offset: chunk.data_offset(width) + at,
                    source: MidiSource::Chunk { id: chunk.id() },
                });
            }
        }
        let at = find_magic(self.bytes)?;
        tracing::debug!(offset = at, "embedded MIDI located by magic scan");
        Some(EmbeddedMidi {
            bytes: &self.bytes[at..],
            offset: at,
            source: MidiSource::MagicScan,
        })
    }
}

fn find_magic(bytes: &[u8]) -> Option<usize> {
    bytes.windows(SMF_MAGIC.len()).position(|w| w == SMF_MAGIC)
}

#[test]
fn unknown_magic_is_a_format_error() {
    use pretty_assertions::assert_eq;
    let err = ContainerKind::detect(b"RIFF\0\0\0\0WAVE").unwrap_err();
    assert_eq!(err, FormatError::UnrecognizedMagic(*b"RIFF"));
    assert_eq!(ContainerKind::detect(b"FO"), Err(FormatError::TooShort(2)));
    assert_eq!(
        ContainerKind::detect(b"FORM\0\0\0\x04AIFC"),
        Ok(ContainerKind::Aifc)
    );
}
