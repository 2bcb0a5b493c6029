//! Chord symbol parsing (`C`, `F#m7`, `Bbmaj7`, `C6add9`, `G♭/D`).

use super::{chord::DetectedChord, templates::quality_for_suffix};
use crate::note::PitchClass;

/// Parses a chord symbol into a chord taken at face value from its template.
///
/// The root is a letter with an optional `#`, `♯`, `b` or `♭`; the rest is a
/// quality key or alias; an optional `/X` names the bass. A leading `?` (root
/// unknown) or an unknown suffix yields `None`.
pub fn parse_chord_symbol(symbol: &str) -> Option<DetectedChord> {
    let symbol = symbol.trim();
    let (body, bass) = match symbol.split_once('/') {
        // `6/9` is a quality, not a slash chord.
        Some((body, rest)) if !body.ends_with('6') || rest != "9" => {
            (body, Some(PitchClass::from_name(rest)?))
        }
        _ => (symbol, None),
    };

    let mut chars = body.char_indices();
    chars.next()?;
    let root_len = match chars.next() {
        Some((at, '#' | '♯' | 'b' | '♭')) => at + body[at..].chars().next()?.len_utf8(),
        Some((at, _)) => at,
        None => body.len(),
    };
    let (root_name, suffix) = body.split_at(root_len);
    let root = PitchClass::from_name(root_name)?;
    let quality = quality_for_suffix(suffix)?;

    let mut chord = DetectedChord::from_template(root, &display_root(root_name), quality);
    chord.bass_pitch_class = bass.filter(|b| *b != root).map(|b| b.value());
    Some(chord)
}

/// Normalises ASCII accidentals to the symbols used elsewhere in the crate.
fn display_root(name: &str) -> String {
    name.replace('#', "♯").replace('b', "♭")
}
