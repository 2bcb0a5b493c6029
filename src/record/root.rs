#![doc = r#"
Root decoding for chord-annotation records.

Two incompatible schemes have been observed, selected by the discriminant
byte at offset 8:

| discriminant | meaning                                                        |
|--------------|----------------------------------------------------------------|
| 1, 2, 3      | flat / natural / sharp; byte 9 mod 12 is the root pitch class  |
| 15           | accidental hint only; byte 9 is 1/2/3 for flat/natural/sharp   |
| other        | unknown                                                        |

A pitch class the accidental cannot spell (a natural C♯, say) is left
undetermined rather than guessed.
"#]

use num_enum::TryFromPrimitive;

use crate::note::{Accidental, NoteEvent, PitchClass};

/// Discriminant of the hint-only scheme.
pub const HINT_SCHEME: u8 = 15;

/// A root name and its pitch class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RootSpelling {
    /// Spelled with the record's accidental, e.g. `G♭`
    pub name: &'static str,
    /// 0..12
    pub pitch_class: PitchClass,
}

/// What a record says about its root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootInfo {
    /// Fully decoded.
    FullRoot {
        /// Name and pitch class
        spelling: RootSpelling,
        /// The accidental table it was spelled from
        accidental: Accidental,
    },
    /// Only an accidental is known. The root must be resolved from the notes.
    AccidentalHint(Accidental),
    /// Unrecognised scheme or unreachable spelling.
    Unknown {
        /// Byte 8 of the record
        discriminant: u8,
        /// Byte 9 of the record
        root_byte: u8,
    },
}

impl RootInfo {
    /// Decodes the two root bytes of a record.
    pub fn decode(discriminant: u8, root_byte: u8) -> Self {
        let unknown = Self::Unknown {
            discriminant,
            root_byte,
        };
        if discriminant == HINT_SCHEME {
            return match Accidental::try_from_primitive(root_byte) {
                Ok(accidental) => Self::AccidentalHint(accidental),
                Err(_) => unknown,
            };
        }
        let Ok(accidental) = Accidental::try_from_primitive(discriminant) else {
            tracing::debug!(discriminant, root_byte, "unrecognised root scheme");
            return unknown;
        };
        let pitch_class = PitchClass::new(root_byte);
        match pitch_class.spell(accidental) {
            Some(name) => Self::FullRoot {
                spelling: RootSpelling { name, pitch_class },
                accidental,
            },
            None => unknown,
        }
    }

    /// The decoded spelling, if the record carried one.
    pub const fn spelling(&self) -> Option<RootSpelling> {
        match self {
            Self::FullRoot { spelling, .. } => Some(*spelling),
            _ => None,
        }
    }
}

/// A root after resolution against the notes of the clip.
///
/// [`RootResolution::Inferred`] comes from the lowest-concurrent-note heuristic
/// and is not as trustworthy as a decoded root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootResolution {
    /// Read straight from the record.
    Decoded(RootSpelling),
    /// Guessed from the lowest note sounding at the event, spelled per the hint.
    Inferred(RootSpelling),
    /// Nothing to go on.
    Unresolved,
}

impl RootResolution {
    /// The spelling, whatever its provenance.
    pub const fn spelling(&self) -> Option<RootSpelling> {
        match self {
            Self::Decoded(s) | Self::Inferred(s) => Some(*s),
            Self::Unresolved => None,
        }
    }
}

/// Heuristic: the lowest note sounding at `tick`, or starting within `tolerance`
/// ticks after it, is taken as the root and spelled with `hint`.
pub fn infer_root(
    hint: Accidental,
    tick: u32,
    tolerance: u32,
    notes: &[NoteEvent],
) -> Option<RootSpelling> {
    let lowest = notes
        .iter()
        .filter(|n| {
            n.sounds_at(tick) || (n.start_tick >= tick && n.start_tick - tick <= tolerance)
        })
        .map(|n| n.pitch)
        .min()?;
    let pitch_class = PitchClass::of_pitch(lowest);
    Some(RootSpelling {
        name: pitch_class.spell(hint).unwrap_or(pitch_class.name()),
        pitch_class,
    })
}
