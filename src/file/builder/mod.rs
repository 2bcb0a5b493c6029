pub mod chunk;

use super::{MidiFile, MidiFileHeader, Track};
use crate::{ChunkError, file::builder::chunk::ChunkEvent, reader::ReaderError};

/// Assembles a [`MidiFile`] from chunks as they are read.
#[derive(Default)]
pub struct MidiFileBuilder<'a> {
    header: Option<MidiFileHeader>,
    tracks: Vec<Track<'a>>,
}

impl<'a> MidiFileBuilder<'a> {
    /// Handles a chunk of a midi file.
    pub fn handle_chunk(&mut self, chunk: ChunkEvent<'a>) -> Result<(), ReaderError> {
        match chunk {
            ChunkEvent::Header(data, offset) => {
                if self.header.is_some() {
                    return Err(ReaderError::parse_error(
                        offset,
                        ChunkError::DuplicateHeader,
                    ));
                }
                self.header = Some(MidiFileHeader::read(data, offset)?);
                Ok(())
            }
            ChunkEvent::Track(data, offset) => {
                if self.header.is_none() {
                    return Err(ReaderError::parse_error(offset, ChunkError::MissingHeader));
                }
                self.tracks.push(Track::parse(data, offset)?);
                Ok(())
            }
            ChunkEvent::Unknown(chunk) => {
                tracing::trace!(id = ?chunk.id(), len = chunk.data().len(), "skipping unknown chunk");
                Ok(())
            }
            ChunkEvent::Eof => Ok(()),
        }
    }

    /// True once every track the header announced has been read.
    ///
    /// Anything after that point is not part of the file. Embedded files are
    /// often followed by unrelated container bytes.
    pub fn is_complete(&self) -> bool {
        self.header
            .is_some_and(|h| self.tracks.len() >= usize::from(h.num_tracks()))
    }

    /// Attempts to finish the midifile from the provided chunks.
    ///
    /// A file that declares more tracks than it contains is accepted with the
    /// tracks that were present.
    pub fn build(self, position: usize) -> Result<MidiFile<'a>, ReaderError> {
        let Some(header) = self.header else {
            return Err(ReaderError::parse_error(position, ChunkError::MissingHeader));
        };
        if self.tracks.len() < usize::from(header.num_tracks()) {
            tracing::warn!(
                declared = header.num_tracks(),
                found = self.tracks.len(),
                "midi file has fewer tracks than declared"
            );
        }
        Ok(MidiFile {
            header,
            tracks: self.tracks,
        })
    }
}
