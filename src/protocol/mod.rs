#![doc = r#"
A private metadata protocol carried in standard meta events.

Everything rides on text (`0x01`) and marker (`0x06`) meta events, so any
other MIDI reader sees an ordinary file:

```text
tick 0      text    MCURATOR:v1 {"type":"file","schema":"clip","version":1,"ppq":480,...}
tick 0      text    MCURATOR:v1 {"type":"leadsheet","text":"C | F G","bars":2}
boundary i  marker  MCURATOR v1 SEG <i> CHORD <symbol>
boundary i  text    MCURATOR:v1 {"seg":<i>,"chord":...,"rootPc":...,"pcsObs":[...],...}
```

Boundaries are rebuilt from marker ticks alone. Per-segment chords come from
the paired JSON when it is present and readable, and from the marker's
`CHORD` word otherwise. Unknown JSON fields are ignored; nothing in a
damaged protocol event aborts the import.

# Example
```rust
# use loopchord::prelude::*;
let seg = Segmentation::new(vec![(0, parse_chord_symbol("C")), (960, parse_chord_symbol("G"))]);
let events = encode_metadata(&FileInfo::new("clip", 480), Some(&seg), None).unwrap();
assert_eq!(events.len(), 5);

let borrowed: Vec<(u32, &MetaMessage)> = events.iter().map(|(t, m)| (*t, m)).collect();
let meta = decode_metadata(&borrowed, 4).unwrap();
assert_eq!(meta.segmentation, Some(seg));
assert_eq!(meta.file.unwrap().ppq, 480);
```
"#]

mod leadsheet;
pub use leadsheet::*;

mod records;
pub use records::*;

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::{
    ProtocolError,
    file::{MetaMessage, TextKind},
    harmony::parse_chord_symbol,
    splice::Segmentation,
};

/// The protocol tag.
pub const PROTOCOL_NAME: &str = "MCURATOR";
/// The protocol version this crate writes.
pub const PROTOCOL_VERSION: u32 = 1;
/// Prefix written on every machine-readable text event. Readers accept any
/// `MCURATOR:v<N> ` prefix.
pub const TEXT_PREFIX: &str = "MCURATOR:v1 ";

/// Everything the protocol recovered from a file.
///
/// `segmentation` is `None` when no segment markers were found, which is
/// distinct from the whole value being absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddedMetadata {
    /// The file-level record
    pub file: Option<FileInfo>,
    /// Boundaries and chords rebuilt from markers
    pub segmentation: Option<Segmentation>,
    /// The lead sheet
    pub leadsheet: Option<Leadsheet>,
}

/// The meta events describing `info`, `segmentation` and `leadsheet`, by tick.
///
/// # Errors
/// If a record cannot be serialised.
pub fn encode_metadata(
    info: &FileInfo,
    segmentation: Option<&Segmentation>,
    leadsheet: Option<&LeadsheetRecord>,
) -> Result<Vec<(u32, MetaMessage<'static>)>, ProtocolError> {
    let mut events = vec![(0, MetaMessage::text(ProtocolRecord::File(info.clone()).to_text()?))];
    if let Some(sheet) = leadsheet {
        events.push((
            0,
            MetaMessage::text(ProtocolRecord::Leadsheet(sheet.clone()).to_text()?),
        ));
    }
    let Some(segmentation) = segmentation else {
        return Ok(events);
    };
    for (seg, (tick, chord)) in segmentation
        .boundaries()
        .iter()
        .zip(segmentation.segment_chords())
        .enumerate()
    {
        let marker = SegmentMarker {
            seg,
            chord: chord.as_ref().map(|c| c.symbol.clone()),
        };
        events.push((*tick, MetaMessage::marker(marker.to_text())));
        let record = SegmentRecord::new(seg, chord.as_ref());
        events.push((*tick, MetaMessage::text(ProtocolRecord::Segment(record).to_text()?)));
    }
    Ok(events)
}

/// Recovers protocol state from a file's meta events.
///
/// Returns `None` if no event belongs to the protocol. Damaged events are
/// logged and skipped.
pub fn decode_metadata(
    events: &[(u32, &MetaMessage<'_>)],
    beats_per_bar: u32,
) -> Option<EmbeddedMetadata> {
    let mut found = false;
    let mut file = None;
    let mut sheet = None;
    let mut records: HashMap<usize, SegmentRecord> = HashMap::new();
    let mut markers: Vec<(u32, SegmentMarker)> = Vec::new();

    for (tick, meta) in events {
        if let Some(text) = meta.text_of(TextKind::Marker) {
            if let Some(marker) = SegmentMarker::from_text(&text) {
                found = true;
                markers.push((*tick, marker));
            }
            continue;
        }
        let Some(text) = meta.text_of(TextKind::Text) else {
            continue;
        };
        match ProtocolRecord::from_text(&text) {
            Err(ProtocolError::NotProtocol) => {}
            Err(error) => {
                found = true;
                warn!(tick, %error, "skipping unreadable protocol event");
            }
            Ok(record) => {
                found = true;
                match record {
                    ProtocolRecord::File(info) => {
                        file.get_or_insert(info);
                    }
                    ProtocolRecord::Leadsheet(record) => {
                        sheet.get_or_insert(record);
                    }
                    ProtocolRecord::Segment(record) => {
                        records.entry(record.seg).or_insert(record);
                    }
                }
            }
        }
    }

    if !found {
        return None;
    }

    let segmentation = (!markers.is_empty()).then(|| {
        let segments = markers
            .into_iter()
            .map(|(tick, marker)| {
                let chord = match records.get(&marker.seg).map(SegmentRecord::to_chord) {
                    Some(Some(chord)) => Some(chord),
                    _ => {
                        debug!(seg = marker.seg, "segment chord taken from marker text");
                        marker.chord.as_deref().and_then(parse_chord_symbol)
                    }
                };
                (tick, chord)
            })
            .collect();
        Segmentation::new(segments)
    });

    Some(EmbeddedMetadata {
        file,
        segmentation,
        leadsheet: sheet.map(|s| Leadsheet::parse(&s.text, s.bars, beats_per_bar)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn decode(events: &[(u32, MetaMessage<'static>)]) -> Option<EmbeddedMetadata> {
        let borrowed: Vec<(u32, &MetaMessage)> = events.iter().map(|(t, m)| (*t, m)).collect();
        decode_metadata(&borrowed, 4)
    }

    #[test]
    fn plain_files_carry_no_metadata() {
        let events = vec![
            (0, MetaMessage::text("Piano".to_string())),
            (0, MetaMessage::marker("Verse".to_string())),
        ];
        assert_eq!(decode(&events), None);
    }

    #[test]
    fn file_info_without_markers_has_no_segmentation() {
        let events = encode_metadata(&FileInfo::new("clip", 960), None, None).unwrap();
        let meta = decode(&events).unwrap();
        assert_eq!(meta.file.map(|f| f.ppq), Some(960));
        assert_eq!(meta.segmentation, None);
    }

    #[test]
    fn markers_alone_rebuild_segmentation() {
        let events = vec![
            (1920, MetaMessage::marker("MCURATOR v1 SEG 1 CHORD F".to_string())),
            (0, MetaMessage::marker("MCURATOR v1 SEG 0 CHORD Am".to_string())),
            (0, MetaMessage::text("MCURATOR:v1 {\"seg\":0,".to_string())),
        ];
        let segmentation = decode(&events).unwrap().segmentation.unwrap();
        assert_eq!(segmentation.boundaries(), &[0, 1920]);
        let symbols: Vec<Option<&str>> = segmentation
            .segment_chords()
            .iter()
            .map(|c| c.as_ref().map(|c| c.symbol.as_str()))
            .collect();
        assert_eq!(symbols, vec![Some("Amin"), Some("Fmaj")]);
    }

    #[test]
    fn json_wins_over_marker_text() {
        let events = vec![
            (0, MetaMessage::marker("MCURATOR v1 SEG 0 CHORD C".to_string())),
            (
                0,
                MetaMessage::text(
                    r#"MCURATOR:v1 {"seg":0,"chord":"Cmaj7","rootPc":0,"pcsObs":[0,4,11],"mood":"dark"}"#
                        .to_string(),
                ),
            ),
        ];
        let segmentation = decode(&events).unwrap().segmentation.unwrap();
        let chord = segmentation.segment_chords()[0].clone().unwrap();
        assert_eq!(chord.symbol, "Cmaj7");
        assert_eq!(chord.missing_pitch_classes, vec![7]);
    }

    #[test]
    fn leadsheet_round_trip() {
        let record = LeadsheetRecord {
            text: "Dm7 | G7".to_string(),
            bars: Some(2),
            extra: Default::default(),
        };
        let events = encode_metadata(&FileInfo::new("clip", 480), None, Some(&record)).unwrap();
        let sheet = decode(&events).unwrap().leadsheet.unwrap();
        assert_eq!(sheet.input_text, "Dm7 | G7");
        assert_eq!(sheet.bars.len(), 2);
        assert_eq!(sheet.bars[1].chords[0].chord, "G7");
    }
}
