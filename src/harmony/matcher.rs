#![doc = r#"
Template matching: from sounding pitches to a named chord.

For every candidate root and every template, the observed pitch-class set is
compared against the transposed template. Candidates that explain fewer than
[`AnalysisConfig::min_template_tones`] template tones are rejected outright, so
a bare dyad never establishes a quality. The survivors are ranked by

1. fewest extra tones,
2. fewest missing tones,
3. shortest template,
4. root equal to the bass,

with table order and then root as the final deterministic tie-break.
"#]

use super::{chord::DetectedChord, templates::TEMPLATES};
use crate::{config::AnalysisConfig, note::PitchClass};

/// The outcome of matching. `chord` is `None` for an unrecognised structure;
/// the observed pitch classes are returned either way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChordMatch {
    /// The best candidate, if any survived.
    pub chord: Option<DetectedChord>,
    /// Distinct observed pitch classes, ascending.
    pub observed: Vec<u8>,
}

/// Reduces MIDI pitches to their distinct pitch classes, ascending.
pub fn pitch_classes(pitches: &[u8]) -> Vec<u8> {
    let mut present = [false; 12];
    for pitch in pitches {
        present[(pitch % 12) as usize] = true;
    }
    (0..12u8).filter(|pc| present[*pc as usize]).collect()
}

/// Matches a multiset of MIDI pitches. The lowest pitch is the bass.
pub fn match_pitches(pitches: &[u8], config: &AnalysisConfig) -> ChordMatch {
    let bass = pitches.iter().min().map(|p| PitchClass::of_pitch(*p));
    match_pitch_classes(&pitch_classes(pitches), bass, config)
}

/// Matches a set of pitch classes with an optional bass.
pub fn match_pitch_classes(
    observed: &[u8],
    bass: Option<PitchClass>,
    config: &AnalysisConfig,
) -> ChordMatch {
    let mut mask = 0u16;
    for pc in observed {
        mask |= 1 << (pc % 12);
    }
    let observed: Vec<u8> = (0..12u8).filter(|pc| mask & (1 << pc) != 0).collect();

    let mut best: Option<(Rank, PitchClass, usize)> = None;
    for (index, quality) in TEMPLATES.iter().enumerate() {
        for root in (0..12).map(PitchClass::new) {
            let template = rotate_mask(quality.mask(), root.value());
            let explained = (template & mask).count_ones() as usize;
            if explained < config.min_template_tones {
                continue;
            }
            let rank = Rank {
                extras: (mask & !template).count_ones(),
                missing: (template & !mask).count_ones(),
                template_len: quality.intervals.len(),
                bass_mismatch: bass.is_some_and(|b| b != root),
                table_order: index,
                root: root.value(),
            };
            if best.as_ref().is_none_or(|(b, _, _)| rank < *b) {
                best = Some((rank, root, index));
            }
        }
    }

    let chord = best.map(|(_, root, index)| {
        DetectedChord::from_observation(root, root.name(), &TEMPLATES[index], &observed, bass)
    });
    ChordMatch { chord, observed }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Rank {
    extras: u32,
    missing: u32,
    template_len: usize,
    bass_mismatch: bool,
    table_order: usize,
    root: u8,
}

fn rotate_mask(mask: u16, by: u8) -> u16 {
    let by = u32::from(by % 12);
    ((mask << by) | (mask >> (12 - by))) & 0x0FFF
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn detect(pitches: &[u8]) -> Option<DetectedChord> {
        match_pitches(pitches, &AnalysisConfig::default()).chord
    }

    #[test]
    fn c_major_triad() {
        let chord = detect(&[60, 64, 67]).unwrap();
        assert_eq!(chord.root_pitch_class, 0);
        assert_eq!(chord.quality_key, "maj");
        assert_eq!(chord.symbol, "Cmaj");
        assert!(chord.extra_pitch_classes.is_empty());
        assert!(chord.missing_pitch_classes.is_empty());
        assert_eq!(chord.bass_pitch_class, None);
    }

    #[test]
    fn inversion_keeps_root_and_reports_bass() {
        let chord = detect(&[52, 55, 60]).unwrap();
        assert_eq!(chord.symbol, "Cmaj");
        assert_eq!(chord.bass_pitch_class, Some(4));
    }

    #[test]
    fn seventh_beats_triad_with_extra() {
        let chord = detect(&[55, 59, 62, 65]).unwrap();
        assert_eq!(chord.symbol, "G7");
    }

    #[test]
    fn bass_breaks_sixth_versus_minor_seventh_tie() {
        // A C E G: Am7 or C6, decided by the bass.
        assert_eq!(detect(&[57, 60, 64, 67]).unwrap().symbol, "Amin7");
        assert_eq!(detect(&[48, 57, 64, 67]).unwrap().symbol, "C6");
    }

    #[test]
    fn extras_are_reported() {
        let chord = detect(&[60, 64, 67, 61]).unwrap();
        assert_eq!(chord.symbol, "Cmaj");
        assert_eq!(chord.extra_pitch_classes, vec![1]);
    }

    #[test]
    fn dyads_are_not_chords() {
        let result = match_pitches(&[60, 67], &AnalysisConfig::default());
        assert_eq!(result.chord, None);
        assert_eq!(result.observed, vec![0, 7]);
        assert_eq!(match_pitches(&[], &AnalysisConfig::default()).chord, None);
    }

    #[test]
    fn mask_rotation_wraps() {
        assert_eq!(rotate_mask(0b1001_0001, 0), 0b1001_0001);
        // C major at G: G B D
        assert_eq!(rotate_mask(0b1001_0001, 7), (1 << 7) | (1 << 11) | (1 << 2));
    }
}
