use super::{FormatType, MetaMessage, MidiFileHeader, Tempo};
use crate::{note::NoteEvent, reader::write_vlq};

#[doc = r#"
Writes a format 0 Standard MIDI File.

All events are collected on one absolute-tick timeline and stable-sorted by
tick. At equal ticks the order is

1. meta events (tempo first, then in the order they were pushed),
2. note-offs,
3. note-ons of zero-length notes,
4. note-offs of zero-length notes,
5. other note-ons,

so markers precede the notes they annotate, a note that ends where another
of the same pitch starts is closed before it is reopened, and a zero-length
note is closed before a longer note of the same pitch opens at its tick.

# Example
```rust
# use loopchord::prelude::*;
let bytes = SmfWriter::new(480)
    .with_tempo(Tempo::from_bpm(90.0))
    .with_notes(&[NoteEvent::new(60, 0, 480, 100)])
    .with_meta(0, MetaMessage::marker("intro"))
    .to_bytes();
let file = MidiFile::parse(&bytes).unwrap();
assert_eq!(file.notes(), vec![NoteEvent::new(60, 0, 480, 100)]);
```
"#]
#[derive(Debug, Clone)]
pub struct SmfWriter<'m> {
    ppq: u16,
    tempo: Tempo,
    channel: u8,
    notes: Vec<NoteEvent>,
    metas: Vec<(u32, MetaMessage<'m>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Slot {
    Meta,
    NoteOff,
    ZeroLengthOn,
    ZeroLengthOff,
    NoteOn,
}

impl<'m> SmfWriter<'m> {
    /// A writer at `ppq` ticks per quarter note, tempo 120.
    pub fn new(ppq: u16) -> Self {
        Self {
            ppq: ppq.max(1),
            tempo: Tempo::DEFAULT,
            channel: 0,
            notes: Vec::new(),
            metas: Vec::new(),
        }
    }

    /// Sets the tempo written at tick 0.
    pub fn with_tempo(mut self, tempo: Tempo) -> Self {
        self.tempo = tempo;
        self
    }

    /// Sets the channel notes are written on (0..16).
    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel & 0x0F;
        self
    }

    /// Adds notes.
    pub fn with_notes(mut self, notes: &[NoteEvent]) -> Self {
        self.notes.extend_from_slice(notes);
        self
    }

    /// Adds a meta event at `tick`.
    pub fn with_meta(mut self, tick: u32, meta: MetaMessage<'m>) -> Self {
        self.push_meta(tick, meta);
        self
    }

    /// Adds a meta event at `tick`. End-of-track is always written by the
    /// writer itself and is ignored here.
    pub fn push_meta(&mut self, tick: u32, meta: MetaMessage<'m>) {
        if meta != MetaMessage::EndOfTrack {
            self.metas.push((tick, meta));
        }
    }

    /// Serializes header and track.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut timeline: Vec<(u32, Slot, Vec<u8>)> =
            Vec::with_capacity(2 + self.metas.len() + 2 * self.notes.len());

        timeline.push((0, Slot::Meta, meta_bytes(&MetaMessage::Tempo(self.tempo))));
        for (tick, meta) in &self.metas {
            timeline.push((*tick, Slot::Meta, meta_bytes(meta)));
        }
        for note in &self.notes {
            let key = note.pitch & 0x7F;
            let velocity = note.velocity.clamp(1, 127);
            let (on, off) = if note.duration_ticks == 0 {
                (Slot::ZeroLengthOn, Slot::ZeroLengthOff)
            } else {
                (Slot::NoteOn, Slot::NoteOff)
            };
            timeline.push((note.start_tick, on, vec![0x90 | self.channel, key, velocity]));
            timeline.push((note.end_tick(), off, vec![0x80 | self.channel, key, 0x40]));
        }
        timeline.sort_by_key(|(tick, slot, _)| (*tick, *slot));

        let mut track = Vec::new();
        let mut last = 0u32;
        for (tick, _, bytes) in &timeline {
            write_vlq(tick - last, &mut track);
            track.extend_from_slice(bytes);
            last = *tick;
        }
        write_vlq(0, &mut track);
        track.extend_from_slice(&meta_bytes(&MetaMessage::EndOfTrack));

        let header = MidiFileHeader::new(FormatType::SingleMultiChannel, 1, self.ppq);
        let mut out = Vec::with_capacity(22 + track.len());
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&header.to_bytes());
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(&track);
        tracing::debug!(
            notes = self.notes.len(),
            metas = self.metas.len(),
            bytes = out.len(),
            "encoded midi file"
        );
        out
    }
}

fn meta_bytes(meta: &MetaMessage<'_>) -> Vec<u8> {
    let payload = meta.payload();
    let mut out = vec![0xFF, meta.subtype()];
    write_vlq(payload.len() as u32, &mut out);
    out.extend_from_slice(&payload);
    out
}
