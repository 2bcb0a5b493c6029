#![doc = r#"
Chord-annotation records embedded in loop containers.

# Layout

Each record is 32 bytes. Only the fields below are understood; the rest are
kept verbatim in [`ChordRecord::raw`] for diagnosis.

```text
0x00  u16 LE  type (= 103)
0x04  u16 LE  interval mask (low 12 bits)
0x08  u8      root discriminant
0x09  u8      root byte
0x18  u8      fractional position
0x19  u8      position, low byte
0x1a  u8      position, high byte
```

The stride of the enclosing track format is unknown, so records are found by
testing the type tag at every 2-byte boundary of a payload. A match is only
accepted when all 32 bytes fit. Decoded events are sorted by position because
byte order does not follow time order.
"#]

mod mask;
pub use mask::*;

mod root;
pub use root::*;

use crate::{
    config::{CALIBRATION_PPQ, DecodeConfig, PositionCalibration},
    harmony::templates::quality_for_intervals,
    note::NoteEvent,
};

/// Size of one record in bytes.
pub const RECORD_SIZE: usize = 32;
/// The type tag marking a chord record.
pub const CHORD_RECORD_TYPE: u16 = 103;

const MASK_OFFSET: usize = 0x04;
const DISCRIMINANT_OFFSET: usize = 0x08;
const ROOT_OFFSET: usize = 0x09;
const FRACTION_OFFSET: usize = 0x18;
const POSITION_LO_OFFSET: usize = 0x19;
const POSITION_HI_OFFSET: usize = 0x1a;

/// A raw record as found in a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChordRecord<'a> {
    raw: &'a [u8; RECORD_SIZE],
    offset: usize,
}

impl<'a> ChordRecord<'a> {
    /// Interprets 32 bytes as a record, if the type tag matches.
    pub fn new(raw: &'a [u8; RECORD_SIZE], offset: usize) -> Option<Self> {
        (u16::from_le_bytes([raw[0], raw[1]]) == CHORD_RECORD_TYPE).then_some(Self { raw, offset })
    }

    /// All 32 bytes.
    pub const fn raw(&self) -> &'a [u8; RECORD_SIZE] {
        self.raw
    }
    /// Offset of the record within the scanned payload.
    pub const fn offset(&self) -> usize {
        self.offset
    }
    /// The interval mask field.
    pub const fn mask(&self) -> IntervalMask {
        IntervalMask::from_bits(u16::from_le_bytes([
            self.raw[MASK_OFFSET],
            self.raw[MASK_OFFSET + 1],
        ]))
    }
    /// Byte 8.
    pub const fn discriminant(&self) -> u8 {
        self.raw[DISCRIMINANT_OFFSET]
    }
    /// Byte 9.
    pub const fn root_byte(&self) -> u8 {
        self.raw[ROOT_OFFSET]
    }
    /// A record with no intervals and no root scheme is a bookmark, not a chord.
    pub const fn is_bookmark(&self) -> bool {
        self.mask().is_empty() && self.discriminant() == 0
    }

    /// The absolute tick of the record on a `ppq` grid.
    ///
    /// Clamped to zero: events at the very start of a loop can land a fraction
    /// of a unit before the origin.
    pub fn tick(&self, calibration: &PositionCalibration, ppq: u16) -> u32 {
        let fraction = i64::from(self.raw[FRACTION_OFFSET]);
        let units = i64::from(u16::from_le_bytes([
            self.raw[POSITION_LO_OFFSET],
            self.raw[POSITION_HI_OFFSET],
        ]));
        let calibrated = ((units - i64::from(calibration.origin))
            * i64::from(calibration.unit_scale)
            + fraction / 2)
            .max(0);
        let rescaled = if ppq == CALIBRATION_PPQ {
            calibrated
        } else {
            (calibrated * i64::from(ppq) + i64::from(CALIBRATION_PPQ) / 2)
                / i64::from(CALIBRATION_PPQ)
        };
        u32::try_from(rescaled).unwrap_or(u32::MAX)
    }

    /// Decodes into a [`ChordEvent`]. Bookmarks yield `None`.
    pub fn decode(&self, calibration: &PositionCalibration, ppq: u16) -> Option<ChordEvent> {
        if self.is_bookmark() {
            return None;
        }
        Some(ChordEvent {
            mask: self.mask(),
            intervals: self.mask().intervals(),
            tick: self.tick(calibration, ppq),
            ppq,
            root: RootInfo::decode(self.discriminant(), self.root_byte()),
            offset: self.offset,
        })
    }
}

/// Finds every record in `payload`, testing the type tag at each 2-byte boundary.
pub fn scan_records(payload: &[u8]) -> impl Iterator<Item = ChordRecord<'_>> {
    (0..payload.len().saturating_sub(RECORD_SIZE - 1))
        .step_by(2)
        .filter(move |off| {
            u16::from_le_bytes([payload[*off], payload[*off + 1]]) == CHORD_RECORD_TYPE
        })
        .filter_map(move |off| {
            let raw: &[u8; RECORD_SIZE] = payload[off..off + RECORD_SIZE].try_into().ok()?;
            ChordRecord::new(raw, off)
        })
}

/// Decodes every chord in `payload`, ascending by position.
pub fn decode_chord_events(payload: &[u8], config: &DecodeConfig) -> Vec<ChordEvent> {
    let mut events: Vec<ChordEvent> = scan_records(payload)
        .filter_map(|record| record.decode(&config.position, config.target_ppq))
        .collect();
    events.sort_by_key(|e| e.tick);
    tracing::debug!(events = events.len(), "decoded chord records");
    events
}

/// One decoded chord annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordEvent {
    mask: IntervalMask,
    intervals: Vec<u8>,
    tick: u32,
    ppq: u16,
    root: RootInfo,
    offset: usize,
}

impl ChordEvent {
    /// The interval set.
    pub const fn mask(&self) -> IntervalMask {
        self.mask
    }
    /// Semitone offsets above the root, strictly ascending.
    pub fn intervals(&self) -> &[u8] {
        &self.intervals
    }
    /// Position in ticks from loop start.
    pub const fn tick(&self) -> u32 {
        self.tick
    }
    /// Ticks per quarter note of [`Self::tick`].
    pub const fn ppq(&self) -> u16 {
        self.ppq
    }
    /// Position in quarter-note beats from loop start.
    pub fn position_beats(&self) -> f64 {
        f64::from(self.tick) / f64::from(self.ppq)
    }
    /// What the record said about the root.
    pub const fn root(&self) -> RootInfo {
        self.root
    }
    /// Offset of the source record within its payload.
    pub const fn record_offset(&self) -> usize {
        self.offset
    }

    /// The quality key whose template equals the interval set, if any.
    pub fn quality_key(&self) -> Option<&'static str> {
        quality_for_intervals(&self.intervals).map(|q| q.key)
    }

    /// Resolves the root, falling back to the lowest concurrent note for
    /// hint-only records.
    pub fn resolve_root(&self, notes: &[NoteEvent]) -> RootResolution {
        match self.root {
            RootInfo::FullRoot { spelling, .. } => RootResolution::Decoded(spelling),
            RootInfo::AccidentalHint(hint) => {
                match infer_root(hint, self.tick, u32::from(self.ppq / 16), notes) {
                    Some(spelling) => RootResolution::Inferred(spelling),
                    None => RootResolution::Unresolved,
                }
            }
            RootInfo::Unknown { .. } => RootResolution::Unresolved,
        }
    }

    /// The chord symbol using the decoded root; `?` stands in for an unknown root.
    pub fn symbol(&self) -> String {
        self.symbol_with_root(self.root.spelling().map(|s| s.name))
    }

    /// The chord symbol with the given root name.
    ///
    /// Interval sets that match no template are written out, e.g. `C(0,1,5)`.
    pub fn symbol_with_root(&self, root: Option<&str>) -> String {
        let root = root.unwrap_or("?");
        match self.quality_key() {
            Some(key) => format!("{root}{key}"),
            None => {
                let intervals: Vec<String> = self.intervals.iter().map(u8::to_string).collect();
                format!("{root}({})", intervals.join(","))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Accidental;
    use pretty_assertions::assert_eq;

    fn record(mask: u16, discriminant: u8, root: u8, position: u16, fraction: u8) -> [u8; 32] {
        let mut raw = [0u8; 32];
        raw[0..2].copy_from_slice(&CHORD_RECORD_TYPE.to_le_bytes());
        raw[4..6].copy_from_slice(&mask.to_le_bytes());
        raw[8] = discriminant;
        raw[9] = root;
        raw[0x18] = fraction;
        raw[0x19..0x1b].copy_from_slice(&position.to_le_bytes());
        raw
    }

    #[test]
    fn symbol_with_and_without_root() {
        let calibration = PositionCalibration::default();
        let unknown = record(0b1001_0001, 0, 0, 15, 0);
        let event = ChordRecord::new(&unknown, 0)
            .unwrap()
            .decode(&calibration, 480)
            .unwrap();
        assert_eq!(event.symbol(), "?maj");

        let known = record(0b1001_0001, 2, 0, 15, 0);
        let event = ChordRecord::new(&known, 0)
            .unwrap()
            .decode(&calibration, 480)
            .unwrap();
        assert_eq!(event.symbol(), "Cmaj");
        assert_eq!(event.intervals(), &[0, 4, 7]);
    }

    #[test]
    fn position_formula() {
        let calibration = PositionCalibration::default();
        let at = |position, fraction, ppq| {
            ChordRecord::new(&record(1, 2, 0, position, fraction), 0)
                .unwrap()
                .tick(&calibration, ppq)
        };
        assert_eq!(at(15, 0, 480), 0);
        assert_eq!(at(16, 0, 480), 128);
        assert_eq!(at(18, 200, 480), 3 * 128 + 100);
        assert_eq!(at(18, 200, 960), 2 * (3 * 128 + 100));
        // a fraction short of the origin clamps to zero
        assert_eq!(at(14, 255, 480), 0);
        assert_eq!(at(0, 0, 480), 0);
    }

    #[test]
    fn bookmarks_are_dropped() {
        let raw = record(0, 0, 0, 20, 0);
        let record = ChordRecord::new(&raw, 0).unwrap();
        assert!(record.is_bookmark());
        assert_eq!(record.decode(&PositionCalibration::default(), 480), None);

        // an empty mask with a root scheme is still reported
        let raw = self::record(0, 2, 0, 20, 0);
        assert!(ChordRecord::new(&raw, 0).is_some_and(|r| !r.is_bookmark()));
    }

    #[test]
    fn scan_finds_unaligned_records_and_sorts_by_position() {
        let mut payload = vec![0xAAu8; 6];
        payload.extend(record(0b1000_1001, 1, 3, 20, 0)); // E♭min at offset 6
        payload.extend([0u8; 2]);
        payload.extend(record(0b1001_0001, 3, 6, 16, 0)); // F♯maj at offset 40
        payload.extend(record(0, 0, 0, 17, 0)); // bookmark
        payload.extend(record(0b1001_0001, 15, 1, 18, 0)); // hint
        payload.extend(&CHORD_RECORD_TYPE.to_le_bytes()); // truncated tail

        let events = decode_chord_events(&payload, &DecodeConfig::default());
        let summary: Vec<(u32, String)> = events.iter().map(|e| (e.tick(), e.symbol())).collect();
        assert_eq!(
            summary,
            vec![
                (128, "F♯maj".to_string()),
                (384, "?maj".to_string()),
                (640, "E♭min".to_string()),
            ]
        );
        assert_eq!(events[0].record_offset(), 40);
        assert_eq!(events[1].root(), RootInfo::AccidentalHint(Accidental::Flat));
    }

    #[test]
    fn unmatched_interval_sets_are_spelled_out() {
        let raw = record(0b10_0011, 2, 0, 15, 0);
        let event = ChordRecord::new(&raw, 0)
            .unwrap()
            .decode(&PositionCalibration::default(), 480)
            .unwrap();
        assert_eq!(event.symbol(), "C(0,1,5)");
    }
}
