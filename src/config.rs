#![doc = r#"
Tunable parameters for decoding, analysis and export.

Each struct implements [`Default`] with the values the formats were calibrated
against, and derives `serde` so a host application can persist its choices.
"#]

use serde::{Deserialize, Serialize};

/// The tick resolution the chord-record position formula was calibrated on.
pub const CALIBRATION_PPQ: u16 = 480;

/// Parameters for turning container bytes into chunks, MIDI and chord events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// Ticks per quarter note that decoded chord positions are expressed in.
    pub target_ppq: u16,
    /// Calibration of the three position bytes in a chord record.
    pub position: PositionCalibration,
    /// Chunk tags whose payloads are scanned for chord records.
    pub annotation_tags: Vec<[u8; 4]>,
    /// Chunk tags that may hold an embedded Standard MIDI File.
    pub midi_tags: Vec<[u8; 4]>,
    /// Chunk tags walked recursively, with the number of prefix bytes to skip.
    pub nested_tags: Vec<NestedTag>,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            target_ppq: CALIBRATION_PPQ,
            position: PositionCalibration::default(),
            annotation_tags: vec![*b"Sequ"],
            midi_tags: vec![*b".mid", *b"MIDI", *b"midi"],
            nested_tags: vec![
                NestedTag {
                    tag: *b"APPL",
                    prefix_len: 4,
                },
                NestedTag {
                    tag: *b"uuid",
                    prefix_len: 16,
                },
            ],
        }
    }
}

impl DecodeConfig {
    /// Use a different output resolution.
    pub fn with_target_ppq(mut self, ppq: u16) -> Self {
        self.target_ppq = ppq;
        self
    }
}

/// A chunk tag that holds further chunks after a fixed-size prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedTag {
    /// The four-byte chunk identifier.
    pub tag: [u8; 4],
    /// Bytes before the nested chunk sequence (an OSType signature, a UUID).
    pub prefix_len: usize,
}

/// Constants of `tick = (u16(lo, hi) - origin) * unit_scale + frac / 2`.
///
/// Both are expressed on the [`CALIBRATION_PPQ`] grid. The defaults place one
/// position unit at 256 ticks of a 960-ppq sequencer (128 at 480) and the
/// origin one 4/4 bar (15 units) into the sequencer's timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionCalibration {
    /// Value of the 16-bit position field at the start of the loop.
    pub origin: u16,
    /// Ticks per unit of the 16-bit position field.
    pub unit_scale: u32,
}

impl Default for PositionCalibration {
    fn default() -> Self {
        Self {
            origin: 15,
            unit_scale: 128,
        }
    }
}

/// Parameters for gesture/harmonic extraction and template matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Quarter-note beats in a bar.
    pub beats_per_bar: u32,
    /// A template match must explain at least this many of its tones.
    pub min_template_tones: usize,
    /// Subdivisions of a beat in the onset-density grid (2 = eighth notes).
    pub grid_per_beat: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            beats_per_bar: 4,
            min_template_tones: 3,
            grid_per_beat: 2,
        }
    }
}

impl AnalysisConfig {
    /// Ticks in one bar at `ppq`.
    pub const fn ticks_per_bar(&self, ppq: u16) -> u32 {
        (ppq as u32).saturating_mul(self.beats_per_bar)
    }
}

/// Parameters written into an exported Standard MIDI File.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Ticks per quarter note of the written file.
    pub ppq: u16,
    /// Tempo written at tick 0.
    pub tempo_bpm: f64,
    /// Schema name recorded in the file-level protocol event.
    pub schema: String,
    /// Tool name recorded in the file-level protocol event.
    pub created_by: String,
    /// Timestamp recorded in the file-level protocol event. Supplied by the caller.
    pub created_at: Option<String>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            ppq: CALIBRATION_PPQ,
            tempo_bpm: 120.0,
            schema: "clip".to_string(),
            created_by: concat!("loopchord ", env!("CARGO_PKG_VERSION")).to_string(),
            created_at: None,
        }
    }
}

#[test]
fn configs_survive_json() {
    use pretty_assertions::assert_eq;
    let config = DecodeConfig::default().with_target_ppq(960);
    let json = serde_json::to_string(&config).unwrap();
    let back: DecodeConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back, config);

    let partial: AnalysisConfig = serde_json::from_str(r#"{"beats_per_bar":3}"#).unwrap();
    assert_eq!(partial.beats_per_bar, 3);
    assert_eq!(partial.min_template_tones, 3);
}
