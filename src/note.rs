use core::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};

#[doc = r#"
A pitch reduced modulo 12, ignoring octave. `0` is C.

# Example
```rust
# use loopchord::prelude::*;
let pc = PitchClass::of_pitch(63);
assert_eq!(pc.value(), 3);
assert_eq!(pc.name(), "E♭");
assert_eq!(pc.spell(Accidental::Sharp), Some("D♯"));
```
"#]
#[derive(Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Debug, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PitchClass(u8);

/// Default spelling used when no accidental preference is known.
const DEFAULT_NAMES: [&str; 12] = [
    "C", "C♯", "D", "E♭", "E", "F", "F♯", "G", "A♭", "A", "B♭", "B",
];

/// Letter names reachable under each accidental. `None` marks a pitch class
/// that accidental cannot spell.
const NATURAL_NAMES: [Option<&str>; 12] = [
    Some("C"),
    None,
    Some("D"),
    None,
    Some("E"),
    Some("F"),
    None,
    Some("G"),
    None,
    Some("A"),
    None,
    Some("B"),
];
const SHARP_NAMES: [Option<&str>; 12] = [
    Some("B♯"),
    Some("C♯"),
    None,
    Some("D♯"),
    None,
    Some("E♯"),
    Some("F♯"),
    None,
    Some("G♯"),
    None,
    Some("A♯"),
    None,
];
const FLAT_NAMES: [Option<&str>; 12] = [
    None,
    Some("D♭"),
    None,
    Some("E♭"),
    Some("F♭"),
    None,
    Some("G♭"),
    None,
    Some("A♭"),
    None,
    Some("B♭"),
    Some("C♭"),
];

impl PitchClass {
    /// Wraps any value into 0..12.
    pub const fn new(value: u8) -> Self {
        Self(value % 12)
    }

    /// The pitch class of a MIDI pitch.
    #[inline]
    pub const fn of_pitch(pitch: u8) -> Self {
        Self(pitch % 12)
    }

    /// 0..12
    #[inline]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Shifted up by `semitones`, wrapping.
    pub const fn transpose(self, semitones: u8) -> Self {
        Self((self.0 + semitones % 12) % 12)
    }

    /// Semitones from `root` up to `self`.
    pub const fn interval_from(self, root: PitchClass) -> u8 {
        (self.0 + 12 - root.0) % 12
    }

    /// The default name (sharps for C♯/F♯, flats elsewhere).
    pub const fn name(&self) -> &'static str {
        DEFAULT_NAMES[self.0 as usize]
    }

    /// The name under a given accidental, if that accidental can reach it.
    pub const fn spell(&self, accidental: Accidental) -> Option<&'static str> {
        let table = match accidental {
            Accidental::Flat => &FLAT_NAMES,
            Accidental::Natural => &NATURAL_NAMES,
            Accidental::Sharp => &SHARP_NAMES,
        };
        table[self.0 as usize]
    }

    /// Looks up a root name such as `C`, `F#`, `Bb`, `G♭`.
    pub fn from_name(name: &str) -> Option<Self> {
        let mut chars = name.chars();
        let base: u8 = match chars.next()? {
            'C' => 0,
            'D' => 2,
            'E' => 4,
            'F' => 5,
            'G' => 7,
            'A' => 9,
            'B' => 11,
            _ => return None,
        };
        let shift: i8 = match chars.next() {
            None => 0,
            Some('#' | '♯') => 1,
            Some('b' | '♭') => -1,
            Some(_) => return None,
        };
        if chars.next().is_some() {
            return None;
        }
        Some(Self(((base as i8 + 12 + shift) % 12) as u8))
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[doc = r#"
An accidental preference, as carried by a chord record's root discriminant.

The discriminant values `1..=3` map directly onto the variants.
"#]
#[derive(
    Copy, Clone, PartialEq, Eq, Debug, Hash, IntoPrimitive, TryFromPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum Accidental {
    /// ♭
    Flat = 1,
    /// ♮
    Natural = 2,
    /// ♯
    Sharp = 3,
}

#[doc = r#"
A note on the tick grid.

Ticks are integers at the clip's pulses-per-quarter-note (conventionally 480).
"#]
#[derive(Copy, Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
pub struct NoteEvent {
    /// MIDI pitch, 0..=127
    pub pitch: u8,
    /// Onset in ticks from clip start
    pub start_tick: u32,
    /// Length in ticks
    pub duration_ticks: u32,
    /// MIDI velocity, 0..=127
    pub velocity: u8,
}

impl NoteEvent {
    /// Create a note.
    pub const fn new(pitch: u8, start_tick: u32, duration_ticks: u32, velocity: u8) -> Self {
        Self {
            pitch,
            start_tick,
            duration_ticks,
            velocity,
        }
    }

    /// Tick at which the note stops sounding.
    #[inline]
    pub const fn end_tick(&self) -> u32 {
        self.start_tick.saturating_add(self.duration_ticks)
    }

    /// The note's pitch class.
    #[inline]
    pub const fn pitch_class(&self) -> PitchClass {
        PitchClass::of_pitch(self.pitch)
    }

    /// True if the note sounds at any point of `[start, end)`.
    ///
    /// Zero-length notes count as sounding at their onset.
    pub const fn overlaps(&self, start: u32, end: u32) -> bool {
        if self.duration_ticks == 0 {
            return self.start_tick >= start && self.start_tick < end;
        }
        self.start_tick < end && self.end_tick() > start
    }

    /// True if the note sounds at `tick`.
    pub const fn sounds_at(&self, tick: u32) -> bool {
        self.overlaps(tick, tick.saturating_add(1))
    }

    /// The same note on a grid of `to` ticks per quarter instead of `from`,
    /// rounded to the nearest tick.
    pub fn rescaled(&self, from: u16, to: u16) -> Self {
        if from == to || from == 0 {
            return *self;
        }
        let scale = |tick: u32| {
            let (from, to) = (u64::from(from), u64::from(to));
            u32::try_from((u64::from(tick) * to + from / 2) / from).unwrap_or(u32::MAX)
        };
        Self {
            start_tick: scale(self.start_tick),
            duration_ticks: scale(self.duration_ticks),
            ..*self
        }
    }
}

#[test]
fn rescaling_rounds_to_the_nearest_tick() {
    let note = NoteEvent::new(60, 97, 480, 90);
    assert_eq!(note.rescaled(96, 480), NoteEvent::new(60, 485, 2400, 90));
    assert_eq!(note.rescaled(480, 960).start_tick, 194);
    assert_eq!(note.rescaled(480, 480), note);
}

#[test]
fn accidental_tables_cover_seven_letters_each() {
    for accidental in [Accidental::Flat, Accidental::Natural, Accidental::Sharp] {
        let reachable = (0..12)
            .filter(|pc| PitchClass::new(*pc).spell(accidental).is_some())
            .count();
        assert_eq!(reachable, 7);
    }
}

#[test]
fn spelling_follows_the_accidental() {
    assert_eq!(PitchClass::new(0).spell(Accidental::Natural), Some("C"));
    assert_eq!(PitchClass::new(6).spell(Accidental::Sharp), Some("F♯"));
    assert_eq!(PitchClass::new(6).spell(Accidental::Flat), Some("G♭"));
    assert_eq!(PitchClass::new(6).spell(Accidental::Natural), None);
}

#[test]
fn names_parse_back() {
    assert_eq!(PitchClass::from_name("Bb"), Some(PitchClass::new(10)));
    assert_eq!(PitchClass::from_name("C♯"), Some(PitchClass::new(1)));
    assert_eq!(PitchClass::from_name("Cb"), Some(PitchClass::new(11)));
    assert_eq!(PitchClass::from_name("H"), None);
    for pc in 0..12 {
        let pc = PitchClass::new(pc);
        assert_eq!(PitchClass::from_name(pc.name()), Some(pc));
    }
}

#[test]
fn note_overlap() {
    let note = NoteEvent::new(60, 480, 480, 100);
    assert!(note.overlaps(0, 481));
    assert!(!note.overlaps(0, 480));
    assert!(!note.overlaps(960, 1920));
    assert!(note.sounds_at(959));
    assert!(!note.sounds_at(960));
}
