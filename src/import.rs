#![doc = r#"
The import and export pipelines.

```text
loop bytes ─ LoopContainer ─┬─ embedded MIDI ─ MidiFile ─ notes ─┐
                            └─ annotation payloads ─ ChordEvent ──┴─ extract ─ LoopImport

SMF bytes ─ MidiFile ─┬─ notes ─ extract ──────────────┐
                      └─ meta events ─ decode_metadata ─┴─ Segmentation::to_bars ─ MidiImport

notes + bars ─ Segmentation::from_bars ─ encode_metadata ─ SmfWriter ─ SMF bytes
```

Only an unrecognised container or an unreadable Standard MIDI File is an
error. A container without MIDI, a file without metadata or a chord without
a root are all ordinary results.
"#]

use tracing::{debug, warn};

use crate::{
    Result,
    config::{AnalysisConfig, DecodeConfig, ExportConfig},
    container::{ContainerKind, LoopContainer, MidiSource},
    file::{MidiFile, SmfWriter, Tempo},
    harmony::{Analysis, BarChordInfo, extract},
    note::NoteEvent,
    protocol::{
        EmbeddedMetadata, FileInfo, LeadsheetRecord, PROTOCOL_VERSION, decode_metadata,
        encode_metadata,
    },
    record::{ChordEvent, RootResolution, decode_chord_events},
    splice::Segmentation,
};

/// A decoded chord annotation with its root resolved against the clip's notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedChord {
    /// The record as decoded
    pub event: ChordEvent,
    /// Where the root came from
    pub root: RootResolution,
}

impl ResolvedChord {
    /// The symbol, using the resolved root when there is one.
    pub fn symbol(&self) -> String {
        self.event
            .symbol_with_root(self.root.spelling().map(|s| s.name))
    }
}

/// Everything recovered from a loop container.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopImport {
    /// The container family
    pub kind: ContainerKind,
    /// Where the embedded MIDI came from, if any was found and readable
    pub midi_source: Option<MidiSource>,
    /// Tempo of the embedded MIDI
    pub tempo: Option<Tempo>,
    /// Ticks per quarter note of every tick in this value
    pub ppq: u16,
    /// Chord annotations, ascending by tick
    pub chords: Vec<ResolvedChord>,
    /// Analysis of the embedded notes; `None` without embedded MIDI
    pub analysis: Option<Analysis>,
}

/// Imports a loop container.
///
/// Notes are rescaled to [`DecodeConfig::target_ppq`] so they share a grid
/// with the chord positions.
///
/// # Errors
/// [`FormatError`](crate::FormatError) if the container is not recognised.
/// An embedded MIDI file that cannot be read is logged and treated as absent.
pub fn import_loop(
    bytes: &[u8],
    decode: &DecodeConfig,
    analysis: &AnalysisConfig,
) -> Result<LoopImport> {
    let container = LoopContainer::parse(bytes, decode)?;
    let ppq = decode.target_ppq.max(1);

    let mut events: Vec<ChordEvent> = container
        .annotation_chunks(decode)
        .flat_map(|chunk| decode_chord_events(chunk.data(), decode))
        .collect();
    events.sort_by_key(ChordEvent::tick);

    let midi = container
        .embedded_midi(decode)
        .and_then(|embedded| match MidiFile::parse_embedded(embedded.bytes) {
            Ok(file) => Some((embedded.source, file)),
            Err(error) => {
                warn!(offset = embedded.offset, %error, "embedded MIDI is unreadable");
                None
            }
        });

    let (midi_source, tempo, notes) = match &midi {
        Some((source, file)) => {
            let notes: Vec<NoteEvent> = file
                .notes()
                .iter()
                .map(|n| n.rescaled(file.ppq(), ppq))
                .collect();
            (Some(*source), Some(file.tempo()), Some(notes))
        }
        None => (None, None, None),
    };

    let chords = events
        .into_iter()
        .map(|event| {
            let root = event.resolve_root(notes.as_deref().unwrap_or_default());
            ResolvedChord { event, root }
        })
        .collect::<Vec<_>>();
    debug!(
        kind = ?container.kind(),
        chords = chords.len(),
        midi = midi_source.is_some(),
        "imported loop"
    );

    Ok(LoopImport {
        kind: container.kind(),
        midi_source,
        tempo,
        ppq,
        chords,
        analysis: notes.map(|notes| extract(&notes, ppq, analysis)),
    })
}

/// Everything recovered from a Standard MIDI File.
#[derive(Debug, Clone, PartialEq)]
pub struct MidiImport {
    /// Ticks per quarter note of the file
    pub ppq: u16,
    /// The first tempo in the file
    pub tempo: Tempo,
    /// Analysis of the notes. When the file carries a segmentation its bar
    /// chords are the segmentation laid over the fresh extraction.
    pub analysis: Analysis,
    /// Protocol state, `None` if the file carries none
    pub metadata: Option<EmbeddedMetadata>,
}

impl MidiImport {
    /// The bars, segmented where the file said so.
    pub fn bars(&self) -> &[BarChordInfo] {
        &self.analysis.harmonic.bar_chords
    }
}

/// Imports a Standard MIDI File, restoring any embedded segmentation.
///
/// # Errors
/// If the bytes are not a readable Standard MIDI File.
pub fn import_midi(bytes: &[u8], config: &AnalysisConfig) -> Result<MidiImport> {
    let file = MidiFile::parse(bytes)?;
    let ppq = file.ppq();
    let mut analysis = extract(&file.notes(), ppq, config);
    let metadata = decode_metadata(&file.meta_events(), config.beats_per_bar);

    if let Some(info) = metadata.as_ref().and_then(|m| m.file.as_ref()) {
        if info.ppq != ppq {
            debug!(declared = info.ppq, header = ppq, "file record disagrees with header");
        }
    }
    if let Some(segmentation) = metadata.as_ref().and_then(|m| m.segmentation.as_ref()) {
        analysis.harmonic.bar_chords =
            segmentation.to_bars(&analysis.harmonic.bar_chords, config.ticks_per_bar(ppq));
    }

    Ok(MidiImport {
        ppq,
        tempo: file.tempo(),
        analysis,
        metadata,
    })
}

#[doc = r#"
A clip ready to be written as a Standard MIDI File with embedded metadata.

Notes and bars are on the grid of [`ExportConfig::ppq`].

# Example
```rust
# use loopchord::prelude::*;
let notes = [NoteEvent::new(57, 0, 1920, 90), NoteEvent::new(60, 0, 1920, 90), NoteEvent::new(64, 0, 1920, 90)];
let analysis = extract(&notes, 480, &AnalysisConfig::default());
let bytes = ClipExport::new(&notes)
    .with_bars(&analysis.harmonic.bar_chords)
    .to_bytes(&ExportConfig::default(), &AnalysisConfig::default())
    .unwrap();

let back = import_midi(&bytes, &AnalysisConfig::default()).unwrap();
assert_eq!(back.bars(), analysis.harmonic.bar_chords.as_slice());
assert_eq!(back.bars()[0].chord.as_ref().unwrap().symbol, "Amin");
```
"#]
#[derive(Debug, Clone, Copy)]
pub struct ClipExport<'a> {
    notes: &'a [NoteEvent],
    bars: &'a [BarChordInfo],
    leadsheet: Option<&'a LeadsheetRecord>,
    previous: Option<&'a FileInfo>,
}

impl<'a> ClipExport<'a> {
    /// An export of `notes` without segmentation.
    pub fn new(notes: &'a [NoteEvent]) -> Self {
        Self {
            notes,
            bars: &[],
            leadsheet: None,
            previous: None,
        }
    }

    /// Writes the bar state as a segmentation.
    pub fn with_bars(mut self, bars: &'a [BarChordInfo]) -> Self {
        self.bars = bars;
        self
    }

    /// Writes a lead sheet.
    pub fn with_leadsheet(mut self, leadsheet: &'a LeadsheetRecord) -> Self {
        self.leadsheet = Some(leadsheet);
        self
    }

    /// Carries the fields of a previously imported file record forward.
    pub fn with_file_info(mut self, previous: &'a FileInfo) -> Self {
        self.previous = Some(previous);
        self
    }

    /// The file record to be written.
    pub fn file_info(&self, config: &ExportConfig) -> FileInfo {
        let mut info = self
            .previous
            .cloned()
            .unwrap_or_else(|| FileInfo::new(config.schema.clone(), config.ppq));
        info.schema = config.schema.clone();
        info.version = PROTOCOL_VERSION;
        info.ppq = config.ppq;
        info.created_by = Some(config.created_by.clone());
        info.created_at = config.created_at.clone();
        info
    }

    /// Serializes the clip.
    ///
    /// # Errors
    /// If a metadata record cannot be serialised.
    pub fn to_bytes(&self, config: &ExportConfig, analysis: &AnalysisConfig) -> Result<Vec<u8>> {
        let segmentation = (!self.bars.is_empty())
            .then(|| Segmentation::from_bars(self.bars, analysis.ticks_per_bar(config.ppq)));
        let metas = encode_metadata(
            &self.file_info(config),
            segmentation.as_ref(),
            self.leadsheet,
        )?;

        let mut writer = SmfWriter::new(config.ppq)
            .with_tempo(Tempo::from_bpm(config.tempo_bpm))
            .with_notes(self.notes);
        for (tick, meta) in metas {
            writer.push_meta(tick, meta);
        }
        Ok(writer.to_bytes())
    }
}

/// Writes `notes` and `bars` as a Standard MIDI File with embedded metadata.
///
/// # Errors
/// If a metadata record cannot be serialised.
pub fn export_midi(
    notes: &[NoteEvent],
    bars: &[BarChordInfo],
    config: &ExportConfig,
    analysis: &AnalysisConfig,
) -> Result<Vec<u8>> {
    ClipExport::new(notes)
        .with_bars(bars)
        .to_bytes(config, analysis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{file::MetaMessage, note::PitchClass, record::RootSpelling};
    use pretty_assertions::assert_eq;

    fn aiff(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
        let mut body = b"AIFF".to_vec();
        for (id, data) in chunks {
            body.extend_from_slice(*id);
            body.extend_from_slice(&(data.len() as u32).to_be_bytes());
            body.extend_from_slice(data);
            if data.len() % 2 == 1 {
                body.push(0);
            }
        }
        let mut out = b"FORM".to_vec();
        out.extend_from_slice(&(body.len() as u32).to_be_bytes());
        out.extend(body);
        out
    }

    fn hint_record(position: u16) -> [u8; 32] {
        let mut raw = [0u8; 32];
        raw[0..2].copy_from_slice(&103u16.to_le_bytes());
        raw[4..6].copy_from_slice(&0b1001_0001u16.to_le_bytes());
        raw[8] = 15;
        raw[9] = 3;
        raw[0x19..0x1b].copy_from_slice(&position.to_le_bytes());
        raw
    }

    #[test]
    fn loop_chords_resolve_against_embedded_notes() {
        // F♯ major, written at 96 ppq
        let midi = SmfWriter::new(96)
            .with_notes(&[
                NoteEvent::new(61, 0, 384, 90),
                NoteEvent::new(42, 0, 384, 90),
                NoteEvent::new(58, 0, 384, 90),
            ])
            .to_bytes();
        let mut annotations = vec![0u8; 6];
        annotations.extend_from_slice(&hint_record(15));
        let bytes = aiff(&[(b"Sequ", &annotations), (b"MIDI", &midi)]);

        let import =
            import_loop(&bytes, &DecodeConfig::default(), &AnalysisConfig::default()).unwrap();
        assert_eq!(import.kind, ContainerKind::Aiff);
        assert_eq!(import.midi_source, Some(MidiSource::Chunk { id: *b"MIDI" }));
        assert_eq!(import.chords.len(), 1);
        assert_eq!(
            import.chords[0].root,
            RootResolution::Inferred(RootSpelling {
                name: "F♯",
                pitch_class: PitchClass::new(6),
            })
        );
        assert_eq!(import.chords[0].symbol(), "F♯maj");

        let analysis = import.analysis.unwrap();
        assert_eq!(analysis.notes[0], NoteEvent::new(42, 0, 1920, 90));
        assert_eq!(analysis.harmonic.chord.unwrap().symbol, "F♯maj");
    }

    #[test]
    fn loops_without_midi_still_yield_chords() {
        let bytes = aiff(&[(b"Sequ", &hint_record(16))]);
        let import =
            import_loop(&bytes, &DecodeConfig::default(), &AnalysisConfig::default()).unwrap();
        assert_eq!(import.midi_source, None);
        assert_eq!(import.analysis, None);
        assert_eq!(import.chords[0].event.tick(), 128);
        assert_eq!(import.chords[0].root, RootResolution::Unresolved);
        assert_eq!(import.chords[0].symbol(), "?maj");
    }

    #[test]
    fn unknown_containers_are_rejected() {
        let error = import_loop(b"RIFF....WAVE", &DecodeConfig::default(), &AnalysisConfig::default())
            .unwrap_err();
        assert!(matches!(error, crate::Error::Format(_)));
    }

    #[test]
    fn unknown_file_fields_survive_reexport() {
        let text = r#"MCURATOR:v1 {"type":"file","schema":"clip","version":1,"ppq":480,"vpSource":"VP-GRIT"}"#;
        let bytes = SmfWriter::new(480)
            .with_notes(&[NoteEvent::new(60, 0, 480, 90)])
            .with_meta(0, MetaMessage::text(text))
            .to_bytes();
        let first = import_midi(&bytes, &AnalysisConfig::default()).unwrap();
        let info = first.metadata.unwrap().file.unwrap();

        let again = ClipExport::new(&first.analysis.notes)
            .with_file_info(&info)
            .to_bytes(&ExportConfig::default(), &AnalysisConfig::default())
            .unwrap();
        let second = import_midi(&again, &AnalysisConfig::default()).unwrap();
        let info = second.metadata.unwrap().file.unwrap();
        assert_eq!(info.extra.get("vpSource"), Some(&"VP-GRIT".into()));
        assert!(info.created_by.unwrap().starts_with("loopchord"));
    }

    #[test]
    fn files_without_protocol_keep_fresh_bars() {
        let notes = [NoteEvent::new(60, 0, 480, 90), NoteEvent::new(64, 0, 480, 90)];
        let bytes = SmfWriter::new(480).with_notes(&notes).to_bytes();
        let import = import_midi(&bytes, &AnalysisConfig::default()).unwrap();
        assert_eq!(import.metadata, None);
        assert_eq!(import.bars().len(), 1);
        assert!(!import.bars()[0].is_segmented());
    }
}
