#![doc = r#"
Gesture and harmonic extraction.

Both summaries are derived wholesale from a note set and are never edited by
hand. Notes are ordered by onset, then pitch; [`Gesture`]'s onset, duration and
velocity sequences and [`Harmonic::pitches`] all follow that order, so index
*i* in any of them refers to the same note.
"#]

use serde::{Deserialize, Serialize};

use super::{
    chord::DetectedChord,
    matcher::{ChordMatch, match_pitches, pitch_classes},
};
use crate::{config::AnalysisConfig, note::NoteEvent};

/// A sub-range of a bar with one chord label. Ticks are relative to the bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Inclusive start, from bar start
    pub start_tick: u32,
    /// Exclusive end, from bar start
    pub end_tick: u32,
    /// `None` for an unrecognised structure
    pub chord: Option<DetectedChord>,
}

impl Segment {
    /// Create a segment
    pub const fn new(start_tick: u32, end_tick: u32, chord: Option<DetectedChord>) -> Self {
        Self {
            start_tick,
            end_tick,
            chord,
        }
    }

    /// True if `tick` lies in `[start, end)`.
    pub const fn contains(&self, tick: u32) -> bool {
        self.start_tick <= tick && tick < self.end_tick
    }

    /// The chord symbol, if any.
    pub fn symbol(&self) -> Option<&str> {
        self.chord.as_ref().map(|c| c.symbol.as_str())
    }
}

#[doc = r#"
The harmony of one bar.

A bar is either *whole-bar* (`segments` is `None` and `chord` covers the bar)
or *segmented* (`segments` partitions `[0, ticks_per_bar)` into contiguous
ascending ranges). In the segmented state `chord` keeps the bar's detected
chord so it can be restored when every segment is pruned away.
"#]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarChordInfo {
    /// Zero-based bar number
    pub bar_index: usize,
    /// The whole-bar chord
    pub chord: Option<DetectedChord>,
    /// Pitch classes sounding in the bar, ascending
    pub pitch_classes: Vec<u8>,
    /// User-authored segmentation, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<Segment>>,
}

impl BarChordInfo {
    /// A whole-bar entry.
    pub fn whole(bar_index: usize, chord: Option<DetectedChord>, pitch_classes: Vec<u8>) -> Self {
        Self {
            bar_index,
            chord,
            pitch_classes,
            segments: None,
        }
    }

    /// True in the segmented state.
    pub const fn is_segmented(&self) -> bool {
        self.segments.is_some()
    }

    /// The chord in effect at `tick` (relative to the bar).
    pub fn chord_at(&self, tick: u32) -> Option<&DetectedChord> {
        match &self.segments {
            Some(segments) => segments
                .iter()
                .find(|s| s.contains(tick))
                .and_then(|s| s.chord.as_ref()),
            None => self.chord.as_ref(),
        }
    }

    /// The bar as a segment list: its segments, or one segment spanning it.
    pub fn as_segments(&self, ticks_per_bar: u32) -> Vec<Segment> {
        match &self.segments {
            Some(segments) => segments.clone(),
            None => vec![Segment::new(0, ticks_per_bar, self.chord.clone())],
        }
    }
}

/// Rhythmic summary of a note set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gesture {
    /// Onset of each note
    pub onsets: Vec<u32>,
    /// Duration of each note
    pub durations: Vec<u32>,
    /// Velocity of each note
    pub velocities: Vec<u8>,
    /// Ticks per quarter note
    pub ticks_per_beat: u32,
    /// Ticks per bar
    pub ticks_per_bar: u32,
    /// `max(1, ceil(last note end / ticks_per_bar))`
    pub bar_count: usize,
    /// Notes per bar
    pub density: f64,
    /// Fraction of notes whose onset falls between beats
    pub syncopation: f64,
    /// Distinct onset-grid slots per bar
    pub onset_density: f64,
    /// Coefficient of variation of the intervals between distinct onsets
    pub ioi_cv: f64,
    /// Mean number of notes sharing an onset
    pub polyphony_mean: f64,
    /// Largest number of notes sharing an onset
    pub polyphony_max: usize,
}

/// Pitch and chord summary of a note set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Harmonic {
    /// Pitch of each note
    pub pitches: Vec<u8>,
    /// Notes per pitch class
    pub pitch_class_histogram: [u32; 12],
    /// Distinct pitch classes, ascending
    pub observed_pitch_classes: Vec<u8>,
    /// The chord of the whole clip
    pub chord: Option<DetectedChord>,
    /// One entry per bar
    pub bar_chords: Vec<BarChordInfo>,
}

/// Notes with their derived summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    /// The notes, ordered by onset then pitch
    pub notes: Vec<NoteEvent>,
    /// Rhythm
    pub gesture: Gesture,
    /// Harmony
    pub harmonic: Harmonic,
}

/// Number of bars covered by `notes`. Never zero.
pub fn bar_count(notes: &[NoteEvent], ticks_per_bar: u32) -> usize {
    let last_end = notes.iter().map(NoteEvent::end_tick).max().unwrap_or(0);
    (last_end.div_ceil(ticks_per_bar.max(1)) as usize).max(1)
}

/// Absolute `[start, end)` of bar `bar_index`. Both ends saturate at
/// `u32::MAX`, so the last bar of a timeline that reaches the end of the tick
/// range is cut short.
pub fn bar_span(bar_index: usize, ticks_per_bar: u32) -> (u32, u32) {
    let start = u32::try_from(bar_index).map_or(u32::MAX, |i| i.saturating_mul(ticks_per_bar));
    (start, start.saturating_add(ticks_per_bar))
}

/// Matches the notes sounding anywhere in `[start, end)` (absolute ticks).
pub fn chord_in_range(
    notes: &[NoteEvent],
    start: u32,
    end: u32,
    config: &AnalysisConfig,
) -> ChordMatch {
    let pitches: Vec<u8> = notes
        .iter()
        .filter(|n| n.overlaps(start, end))
        .map(|n| n.pitch)
        .collect();
    match_pitches(&pitches, config)
}

/// Whole-bar chords for `bars` bars.
pub fn bar_chords(
    notes: &[NoteEvent],
    ppq: u16,
    bars: usize,
    config: &AnalysisConfig,
) -> Vec<BarChordInfo> {
    let ticks_per_bar = config.ticks_per_bar(ppq);
    (0..bars)
        .map(|bar| {
            let (start, end) = bar_span(bar, ticks_per_bar);
            let matched = chord_in_range(notes, start, end, config);
            BarChordInfo::whole(bar, matched.chord, matched.observed)
        })
        .collect()
}

/// Derives [`Gesture`] and [`Harmonic`] from a note set.
pub fn extract(notes: &[NoteEvent], ppq: u16, config: &AnalysisConfig) -> Analysis {
    let mut notes = notes.to_vec();
    notes.sort_by_key(|n| (n.start_tick, n.pitch, n.duration_ticks));

    let ticks_per_beat = u32::from(ppq.max(1));
    let ticks_per_bar = config.ticks_per_bar(ppq.max(1));
    let bars = bar_count(&notes, ticks_per_bar);

    let gesture = gesture(&notes, ticks_per_beat, ticks_per_bar, bars, config);

    let pitches: Vec<u8> = notes.iter().map(|n| n.pitch).collect();
    let mut pitch_class_histogram = [0u32; 12];
    for pitch in &pitches {
        pitch_class_histogram[usize::from(pitch % 12)] += 1;
    }
    let overall = match_pitches(&pitches, config);
    let harmonic = Harmonic {
        observed_pitch_classes: pitch_classes(&pitches),
        pitches,
        pitch_class_histogram,
        chord: overall.chord,
        bar_chords: bar_chords(&notes, ppq.max(1), bars, config),
    };
    tracing::trace!(notes = notes.len(), bars, "extracted gesture and harmony");

    Analysis {
        notes,
        gesture,
        harmonic,
    }
}

fn gesture(
    notes: &[NoteEvent],
    ticks_per_beat: u32,
    ticks_per_bar: u32,
    bars: usize,
    config: &AnalysisConfig,
) -> Gesture {
    let onsets: Vec<u32> = notes.iter().map(|n| n.start_tick).collect();
    let bars_f = bars as f64;

    let off_beat = onsets.iter().filter(|o| *o % ticks_per_beat != 0).count();
    let syncopation = if onsets.is_empty() {
        0.0
    } else {
        off_beat as f64 / onsets.len() as f64
    };

    let slot = u64::from((ticks_per_beat / config.grid_per_beat.max(1)).max(1));
    let mut slots: Vec<u64> = onsets
        .iter()
        .map(|o| (u64::from(*o) + slot / 2) / slot)
        .collect();
    slots.dedup();

    let mut distinct = onsets.clone();
    distinct.dedup();
    let iois: Vec<f64> = distinct.windows(2).map(|w| f64::from(w[1] - w[0])).collect();
    let ioi_cv = if iois.len() > 1 {
        let mean = iois.iter().sum::<f64>() / iois.len() as f64;
        let variance =
            iois.iter().map(|i| (i - mean).powi(2)).sum::<f64>() / (iois.len() - 1) as f64;
        if mean > 0.0 { variance.sqrt() / mean } else { 0.0 }
    } else {
        0.0
    };

    let groups: Vec<usize> = onsets
        .chunk_by(|a, b| a == b)
        .map(<[u32]>::len)
        .collect();
    let polyphony_max = groups.iter().copied().max().unwrap_or(0);
    let polyphony_mean = if groups.is_empty() {
        0.0
    } else {
        groups.iter().sum::<usize>() as f64 / groups.len() as f64
    };

    Gesture {
        durations: notes.iter().map(|n| n.duration_ticks).collect(),
        velocities: notes.iter().map(|n| n.velocity).collect(),
        ticks_per_beat,
        ticks_per_bar,
        bar_count: bars,
        density: notes.len() as f64 / bars_f,
        syncopation,
        onset_density: slots.len() as f64 / bars_f,
        ioi_cv,
        polyphony_mean,
        polyphony_max,
        onsets,
    }
}
