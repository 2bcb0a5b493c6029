use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{PROTOCOL_NAME, PROTOCOL_VERSION, ProtocolError, TEXT_PREFIX};
use tracing::debug;
use crate::harmony::{DetectedChord, parse_chord_symbol, templates::quality_for_suffix};
use crate::note::PitchClass;

/// File-level protocol event, carried at tick 0.
///
/// Fields this version does not know about are kept in `extra` and written
/// back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Schema name, e.g. `clip`
    pub schema: String,
    /// Schema version
    pub version: u32,
    /// Ticks per quarter note of the file
    pub ppq: u16,
    /// Creation timestamp, as supplied by the exporter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Exporting tool
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FileInfo {
    /// A file record for the current protocol version.
    pub fn new(schema: impl Into<String>, ppq: u16) -> Self {
        Self {
            schema: schema.into(),
            version: PROTOCOL_VERSION,
            ppq,
            created_at: None,
            created_by: None,
            extra: Map::new(),
        }
    }
}

/// Lead-sheet protocol event, carried at tick 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadsheetRecord {
    /// The chord chart as typed, e.g. `C | F G | %`
    pub text: String,
    /// Number of bars the chart covers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bars: Option<usize>,
    /// Unrecognised fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Text events tagged with a `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TypedRecord {
    /// `{"type":"file",...}`
    File(FileInfo),
    /// `{"type":"leadsheet",...}`
    Leadsheet(LeadsheetRecord),
}

/// Per-segment text event, paired with a marker at the same tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentRecord {
    /// Index of the segment
    pub seg: usize,
    /// Chord symbol
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chord: Option<String>,
    /// Root pitch class
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_pc: Option<u8>,
    /// Observed pitch classes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcs_obs: Option<Vec<u8>>,
    /// Template pitch classes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcs_tpl: Option<Vec<u8>>,
    /// Observed pitch classes outside the template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extras: Option<Vec<u8>>,
    /// Lowest sounding pitch class, when it is not the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass_pc: Option<u8>,
}

impl SegmentRecord {
    /// Describes `chord` as segment `seg`.
    pub fn new(seg: usize, chord: Option<&DetectedChord>) -> Self {
        match chord {
            None => Self {
                seg,
                ..Self::default()
            },
            Some(chord) => Self {
                seg,
                chord: Some(chord.symbol.clone()),
                root_pc: Some(chord.root_pitch_class),
                pcs_obs: Some(chord.observed_pitch_classes.clone()),
                pcs_tpl: Some(chord.template_pitch_classes.clone()),
                extras: Some(chord.extra_pitch_classes.clone()),
                bass_pc: chord.bass_pitch_class,
            },
        }
    }

    /// Rebuilds the chord. The symbol names the root and quality; `rootPc`
    /// wins over the symbol's root if both are present. Observed pitch classes
    /// default to the template when absent.
    pub fn to_chord(&self) -> Option<DetectedChord> {
        let parsed = parse_chord_symbol(self.chord.as_deref()?)?;
        let quality = quality_for_suffix(&parsed.quality_key)?;
        let root = self
            .root_pc
            .map(PitchClass::new)
            .unwrap_or_else(|| parsed.root());
        let root_name = if root == parsed.root() {
            parsed.root_name.clone()
        } else {
            root.name().to_string()
        };
        let observed = self.pcs_obs.as_deref().unwrap_or(&parsed.template_pitch_classes);
        Some(DetectedChord::from_observation(
            root,
            &root_name,
            quality,
            observed,
            self.bass_pc.map(PitchClass::new),
        ))
    }
}

/// Any protocol text event.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolRecord {
    /// File-level info
    File(FileInfo),
    /// Lead sheet
    Leadsheet(LeadsheetRecord),
    /// One segment
    Segment(SegmentRecord),
}

impl ProtocolRecord {
    /// The text of the meta event carrying this record.
    pub fn to_text(&self) -> Result<String, ProtocolError> {
        let json = match self {
            Self::File(info) => serde_json::to_string(&TypedRecord::File(info.clone())),
            Self::Leadsheet(sheet) => {
                serde_json::to_string(&TypedRecord::Leadsheet(sheet.clone()))
            }
            Self::Segment(segment) => serde_json::to_string(segment),
        }?;
        Ok(format!("{TEXT_PREFIX}{json}"))
    }

    /// Parses the text of a meta event.
    ///
    /// Text without a `MCURATOR:v<N> ` prefix is
    /// [`ProtocolError::NotProtocol`]. Any version is read; unknown fields are
    /// ignored and unknown `type`s are [`ProtocolError::UnknownType`].
    pub fn from_text(text: &str) -> Result<Self, ProtocolError> {
        let (version, json) = split_text_prefix(text).ok_or(ProtocolError::NotProtocol)?;
        if version != PROTOCOL_VERSION {
            debug!(version, "reading a record of another protocol version");
        }
        let value: Value = serde_json::from_str(json)?;
        let record = match value.get("type").and_then(Value::as_str) {
            Some("file" | "leadsheet") => match serde_json::from_value::<TypedRecord>(value)? {
                TypedRecord::File(info) => Self::File(info),
                TypedRecord::Leadsheet(sheet) => Self::Leadsheet(sheet),
            },
            Some(other) => return Err(ProtocolError::UnknownType(other.to_string())),
            None => Self::Segment(serde_json::from_value(value)?),
        };
        Ok(record)
    }
}

/// Splits `MCURATOR:v<N> <json>` into the version and the JSON body.
fn split_text_prefix(text: &str) -> Option<(u32, &str)> {
    let rest = text.strip_prefix(PROTOCOL_NAME)?.strip_prefix(":v")?;
    let (version, json) = rest.split_once(' ')?;
    Some((version.parse().ok()?, json))
}

/// A parsed segment marker: `<name> v<version> SEG <index> [CHORD <symbol>]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentMarker {
    /// Segment index
    pub seg: usize,
    /// Chord symbol, if the marker names one
    pub chord: Option<String>,
}

impl SegmentMarker {
    /// The marker text.
    pub fn to_text(&self) -> String {
        match &self.chord {
            Some(chord) => format!("{PROTOCOL_NAME} v{PROTOCOL_VERSION} SEG {} CHORD {chord}", self.seg),
            None => format!("{PROTOCOL_NAME} v{PROTOCOL_VERSION} SEG {}", self.seg),
        }
    }

    /// Parses marker text. Any version of the protocol is accepted.
    pub fn from_text(text: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        if words.next()? != PROTOCOL_NAME {
            return None;
        }
        words.next()?.strip_prefix('v')?.parse::<u32>().ok()?;
        if words.next()? != "SEG" {
            return None;
        }
        let seg = words.next()?.parse().ok()?;
        let chord = match words.next() {
            Some("CHORD") => words.next().map(str::to_string),
            _ => None,
        };
        Some(Self { seg, chord })
    }
}
