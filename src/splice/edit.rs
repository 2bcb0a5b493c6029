use super::bar::override_bar;
use crate::{
    config::AnalysisConfig,
    harmony::{Analysis, BarChordInfo, DetectedChord, bar_span, extract},
    note::{NoteEvent, PitchClass},
};

/// Applies an override of the absolute range `[start, end)` to every bar it
/// touches. Bars outside the range are returned unchanged.
pub fn override_range(
    bars: &[BarChordInfo],
    start: u32,
    end: u32,
    chord: Option<DetectedChord>,
    notes: &[NoteEvent],
    ticks_per_bar: u32,
) -> Vec<BarChordInfo> {
    bars.iter()
        .map(|bar| {
            let (bar_start, bar_end) = bar_span(bar.bar_index, ticks_per_bar);
            if end <= bar_start || start >= bar_end {
                return bar.clone();
            }
            override_bar(
                bar,
                start.saturating_sub(bar_start),
                end.min(bar_end) - bar_start,
                chord.clone(),
                notes,
                ticks_per_bar,
            )
        })
        .collect()
}

/// Rewrites the pitches of notes with onset in `[start, end)` to tones of
/// `chord`.
///
/// Notes sharing an onset form one voicing. Sorted by pitch, voice *i* takes
/// chord tone *i* (cycling through the tones from the root up) and is placed in
/// the octave nearest its original pitch, the lower one on a tie. Timing and
/// velocity are untouched.
pub fn revoice(notes: &[NoteEvent], start: u32, end: u32, chord: &DetectedChord) -> Vec<NoteEvent> {
    let tones = chord.chord_tones();
    if tones.is_empty() {
        return notes.to_vec();
    }

    let mut out = notes.to_vec();
    let mut in_range: Vec<usize> = (0..notes.len())
        .filter(|i| (start..end).contains(&notes[*i].start_tick))
        .collect();
    in_range.sort_by_key(|i| (notes[*i].start_tick, notes[*i].pitch));

    for group in in_range.chunk_by(|a, b| notes[*a].start_tick == notes[*b].start_tick) {
        for (voice, index) in group.iter().enumerate() {
            let tone = tones[voice % tones.len()];
            out[*index].pitch = nearest_pitch(notes[*index].pitch, tone);
        }
    }
    out
}

/// The MIDI pitch of class `tone` nearest to `pitch`, ties downward.
fn nearest_pitch(pitch: u8, tone: PitchClass) -> u8 {
    let pitch = i16::from(pitch);
    let base = pitch - pitch.rem_euclid(12) + i16::from(tone.value());
    [base - 12, base, base + 12]
        .into_iter()
        .filter(|p| (0..=127).contains(p))
        .min_by_key(|p| ((p - pitch).abs(), *p))
        .map_or(0, |p| p as u8)
}

/// Carries user segmentation across a re-extraction.
///
/// `fresh` comes from extracting the edited notes and knows nothing of
/// segments. Bars that do not touch `[start, end)` keep their `prior` state
/// verbatim. Bars that do touch it take the `prior` segment list, with the
/// fresh pitch classes, and have `chord` spliced in by [`override_bar`]. Bars
/// that only exist in `fresh` are taken from it.
pub fn merge_bars(
    fresh: &[BarChordInfo],
    prior: &[BarChordInfo],
    start: u32,
    end: u32,
    chord: &DetectedChord,
    notes: &[NoteEvent],
    ticks_per_bar: u32,
) -> Vec<BarChordInfo> {
    fresh
        .iter()
        .map(|fresh_bar| {
            let Some(prior_bar) = prior.iter().find(|b| b.bar_index == fresh_bar.bar_index) else {
                return fresh_bar.clone();
            };
            let (bar_start, bar_end) = bar_span(fresh_bar.bar_index, ticks_per_bar);
            if end <= bar_start || start >= bar_end {
                return prior_bar.clone();
            }
            let base = BarChordInfo {
                pitch_classes: fresh_bar.pitch_classes.clone(),
                ..prior_bar.clone()
            };
            override_bar(
                &base,
                start.saturating_sub(bar_start),
                end.min(bar_end) - bar_start,
                Some(chord.clone()),
                notes,
                ticks_per_bar,
            )
        })
        .collect()
}

/// The outcome of a substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct Substitution {
    /// The fresh extraction of the revoiced notes, with `bar_chords` replaced
    /// by the merged bars.
    pub analysis: Analysis,
}

impl Substitution {
    /// The revoiced notes
    pub fn notes(&self) -> &[NoteEvent] {
        &self.analysis.notes
    }
    /// The merged bars
    pub fn bars(&self) -> &[BarChordInfo] {
        &self.analysis.harmonic.bar_chords
    }
}

/// Substitutes `chord` over `[start, end)`: revoices the notes, re-extracts
/// everything and merges the prior bar state back in.
pub fn substitute(
    notes: &[NoteEvent],
    prior: &[BarChordInfo],
    start: u32,
    end: u32,
    chord: &DetectedChord,
    ppq: u16,
    config: &AnalysisConfig,
) -> Substitution {
    let revoiced = revoice(notes, start, end, chord);
    let mut analysis = extract(&revoiced, ppq, config);
    let merged = merge_bars(
        &analysis.harmonic.bar_chords,
        prior,
        start,
        end,
        chord,
        &analysis.notes,
        config.ticks_per_bar(ppq),
    );
    tracing::debug!(start, end, chord = %chord, "substituted chord");
    analysis.harmonic.bar_chords = merged;
    Substitution { analysis }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::{Segment, parse_chord_symbol};
    use pretty_assertions::assert_eq;

    #[test]
    fn nearest_octave_ties_down() {
        let c = PitchClass::new(0);
        assert_eq!(nearest_pitch(64, c), 60);
        assert_eq!(nearest_pitch(66, c), 60);
        assert_eq!(nearest_pitch(67, c), 72);
        assert_eq!(nearest_pitch(2, PitchClass::new(11)), 11);
        assert_eq!(nearest_pitch(125, PitchClass::new(7)), 127);
    }

    #[test]
    fn revoice_maps_voices_to_tones_in_order() {
        let notes = [
            NoteEvent::new(67, 0, 480, 80),
            NoteEvent::new(60, 0, 480, 80),
            NoteEvent::new(64, 0, 480, 80),
            NoteEvent::new(72, 0, 480, 80),
            NoteEvent::new(60, 960, 480, 80),
        ];
        let f = parse_chord_symbol("F").unwrap();
        let revoiced = revoice(&notes, 0, 960, &f);
        // 60 -> F, 64 -> A, 67 -> C, 72 -> F
        let pitches: Vec<u8> = revoiced.iter().map(|n| n.pitch).collect();
        assert_eq!(pitches, vec![72, 65, 69, 77, 60]);
    }

    #[test]
    fn override_range_spans_bar_lines() {
        let c = parse_chord_symbol("C");
        let g = parse_chord_symbol("G");
        let bars = vec![
            BarChordInfo::whole(0, c.clone(), vec![]),
            BarChordInfo::whole(1, c.clone(), vec![]),
            BarChordInfo::whole(2, c.clone(), vec![]),
        ];
        let notes = [NoteEvent::new(48, 0, 5760, 90)];
        let edited = override_range(&bars, 960, 3840, g.clone(), &notes, 1920);
        assert_eq!(
            edited[0].segments,
            Some(vec![Segment::new(0, 960, c.clone()), Segment::new(960, 1920, g.clone())])
        );
        assert_eq!(edited[1], BarChordInfo::whole(1, g, vec![]));
        assert_eq!(edited[2], bars[2]);
    }
}
