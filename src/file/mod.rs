#![doc = r#"
Rusty representation of a Standard MIDI File.

[`MidiFile::parse`] reads a header and its tracks, borrowing payloads from the
input. Notes are paired across all tracks by [`MidiFile::notes`]; meta events
from all tracks are merged onto one timeline by [`MidiFile::meta_events`].
[`SmfWriter`] produces format 0 files that parse back to the same notes and
meta events.
"#]

/// Contains the [`MidiFileBuilder`](builder::MidiFileBuilder) and the chunk
/// framing it consumes.
pub mod builder;

mod header;
pub use header::*;

mod meta;
pub use meta::*;

mod notes;
pub use notes::*;

mod tempo;
pub use tempo::*;

mod track;
pub use track::*;

mod writer;
pub use writer::*;

use itertools::Itertools;

use crate::{
    file::builder::{
        MidiFileBuilder,
        chunk::{Framing, read_chunk},
    },
    note::NoteEvent,
    reader::{ReadResult, Reader},
};

#[doc = r#"
A parsed Standard MIDI File.

# Example
```rust
# use loopchord::prelude::*;
let bytes = SmfWriter::new(960)
    .with_notes(&[NoteEvent::new(48, 0, 960, 80)])
    .to_bytes();
let file = MidiFile::parse(&bytes).unwrap();
assert_eq!(file.ppq(), 960);
assert_eq!(file.tempo(), Tempo::DEFAULT);
assert_eq!(file.notes().len(), 1);
```
"#]
#[derive(Clone, Debug, PartialEq)]
pub struct MidiFile<'a> {
    header: MidiFileHeader,
    tracks: Vec<Track<'a>>,
}

impl<'a> MidiFile<'a> {
    /// Parse a set of bytes into a file struct.
    ///
    /// Reading stops once the tracks announced by the header have been read,
    /// so bytes trailing the file are never looked at.
    pub fn parse(bytes: &'a [u8]) -> ReadResult<Self> {
        Self::parse_with(bytes, Framing::Strict)
    }

    /// Like [`MidiFile::parse`], but a chunk whose declared length runs past
    /// the buffer is cut to the bytes that remain instead of failing.
    ///
    /// Meant for files lifted out of other containers, where the declared
    /// lengths are not always right.
    pub fn parse_embedded(bytes: &'a [u8]) -> ReadResult<Self> {
        Self::parse_with(bytes, Framing::Clamped)
    }

    fn parse_with(bytes: &'a [u8], framing: Framing) -> ReadResult<Self> {
        let mut reader = Reader::from_byte_slice(bytes);
        let mut builder = MidiFileBuilder::default();

        while !builder.is_complete() {
            let chunk = read_chunk(&mut reader, framing)?;
            if chunk.is_eof() {
                break;
            }
            builder.handle_chunk(chunk)?;
        }

        builder.build(reader.buffer_position())
    }

    /// Returns header info
    pub const fn header(&self) -> &MidiFileHeader {
        &self.header
    }

    /// Ticks per quarter note
    pub const fn ppq(&self) -> u16 {
        self.header.ppq()
    }

    /// Returns the track list
    pub fn tracks(&self) -> &[Track<'a>] {
        &self.tracks
    }

    /// The first tempo in the file, or 120 BPM if there is none.
    pub fn tempo(&self) -> Tempo {
        self.meta_events()
            .into_iter()
            .find_map(|(_, meta)| match meta {
                MetaMessage::Tempo(tempo) => Some(*tempo),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Every note in the file, ordered by onset then pitch.
    ///
    /// Tracks are paired independently and merged; unterminated notes are
    /// closed at the last tick of their own track.
    pub fn notes(&self) -> Vec<NoteEvent> {
        let mut notes: Vec<NoteEvent> = self
            .tracks
            .iter()
            .flat_map(|track| pair_notes(track.events(), track.end_tick()))
            .collect();
        notes.sort_by_key(|n| (n.start_tick, n.pitch, n.duration_ticks));
        notes
    }

    /// Meta events of all tracks on one timeline, ascending by tick.
    pub fn meta_events(&self) -> Vec<(u32, &MetaMessage<'a>)> {
        self.tracks
            .iter()
            .map(|track| track.events().iter())
            .kmerge_by(|a, b| a.tick() < b.tick())
            .filter_map(|event| event.message().as_meta().map(|meta| (event.tick(), meta)))
            .collect()
    }

    /// The tick of the last event in any track.
    pub fn end_tick(&self) -> u32 {
        self.tracks.iter().map(Track::end_tick).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ChunkError, ParseError, reader::ReaderErrorKind};
    use pretty_assertions::assert_eq;

    fn chunk(id: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn multi_track_files_are_merged() {
        let mut bytes = chunk(b"MThd", &[0, 1, 0, 2, 0, 96]);
        bytes.extend(chunk(
            b"MTrk",
            &[0x00, 0xFF, 0x06, 0x01, b'A', 0x60, 0x90, 60, 80, 0x60, 0x80, 60, 0],
        ));
        bytes.extend(chunk(
            b"MTrk",
            &[0x00, 0x91, 48, 70, 0x30, 0xFF, 0x06, 0x01, b'B', 0x81, 0x10, 0x81, 48, 0],
        ));
        let file = MidiFile::parse(&bytes).unwrap();
        assert_eq!(file.header().format_type(), FormatType::Simultaneous);
        assert_eq!(
            file.notes(),
            vec![NoteEvent::new(48, 0, 192, 70), NoteEvent::new(60, 96, 96, 80)]
        );
        let markers: Vec<(u32, String)> = file
            .meta_events()
            .into_iter()
            .filter_map(|(tick, meta)| Some((tick, meta.text_of(TextKind::Marker)?.into_owned())))
            .collect();
        assert_eq!(markers, vec![(0, "A".to_string()), (48, "B".to_string())]);
        assert_eq!(file.end_tick(), 192);
    }

    #[test]
    fn trailing_container_bytes_are_ignored() {
        let mut bytes = SmfWriter::new(480)
            .with_notes(&[NoteEvent::new(60, 0, 480, 100)])
            .to_bytes();
        bytes.extend_from_slice(b"SSND\x00\x00\x10\x00garbage");
        assert_eq!(MidiFile::parse(&bytes).unwrap().notes().len(), 1);
    }

    #[test]
    fn embedded_track_lengths_are_clamped() {
        let mut bytes = SmfWriter::new(480)
            .with_notes(&[NoteEvent::new(60, 0, 480, 100)])
            .to_bytes();
        let declared = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) + 1;
        bytes[18..22].copy_from_slice(&declared.to_be_bytes());

        let err = MidiFile::parse(&bytes).unwrap_err();
        assert!(matches!(
            err.error_kind(),
            ReaderErrorKind::ParseError(ParseError::Chunk(ChunkError::SizeOverflow { .. }))
        ));
        let file = MidiFile::parse_embedded(&bytes).unwrap();
        assert_eq!(file.notes(), vec![NoteEvent::new(60, 0, 480, 100)]);
    }

    #[test]
    fn tracks_need_a_header() {
        let bytes = chunk(b"MTrk", &[0x00, 0xFF, 0x2F, 0x00]);
        let err = MidiFile::parse(&bytes).unwrap_err();
        assert_eq!(
            err.error_kind(),
            &ReaderErrorKind::ParseError(ParseError::Chunk(ChunkError::MissingHeader))
        );
        assert!(MidiFile::parse(&[]).is_err());
    }

    #[test]
    fn unknown_meta_events_survive_a_rewrite() {
        let bytes = SmfWriter::new(480)
            .with_meta(
                0,
                MetaMessage::Other {
                    subtype: 0x7F,
                    data: vec![0x00, 0x00, 0x41, 0x01].into(),
                },
            )
            .to_bytes();
        let file = MidiFile::parse(&bytes).unwrap();
        let metas: Vec<MetaMessage<'static>> = file
            .meta_events()
            .into_iter()
            .map(|(_, meta)| meta.clone().into_owned())
            .collect();
        let rewritten = metas
            .iter()
            .cloned()
            .fold(SmfWriter::new(480), |w, meta| w.with_meta(0, meta))
            .to_bytes();
        assert!(
            MidiFile::parse(&rewritten)
                .unwrap()
                .meta_events()
                .iter()
                .any(|(_, m)| m.subtype() == 0x7F && m.payload().as_ref() == [0x00, 0x00, 0x41, 0x01])
        );
    }
}
