use serde::{Deserialize, Serialize};

use crate::harmony::{BarChordInfo, DetectedChord, Segment, bar_span};

#[doc = r#"
Clip-wide segmentation: boundary ticks from clip start and one chord per
segment.

Segment *i* spans `[boundaries[i], boundaries[i + 1])`; the last one runs to the
end of the clip. Boundaries are strictly increasing; the constructor sorts and
de-duplicates (the first chord given for a tick wins).

# Example
```rust
# use loopchord::prelude::*;
let c = parse_chord_symbol("C");
let g = parse_chord_symbol("G");
let seg = Segmentation::new(vec![(960, g.clone()), (0, c.clone()), (960, None)]);
assert_eq!(seg.boundaries(), &[0, 960]);
assert_eq!(seg.segment_chords(), &[c, g]);
```
"#]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segmentation {
    boundaries: Vec<u32>,
    segment_chords: Vec<Option<DetectedChord>>,
}

impl Segmentation {
    /// Builds a segmentation from `(boundary, chord)` pairs in any order.
    pub fn new(mut segments: Vec<(u32, Option<DetectedChord>)>) -> Self {
        segments.sort_by_key(|(tick, _)| *tick);
        segments.dedup_by_key(|(tick, _)| *tick);
        let (boundaries, segment_chords) = segments.into_iter().unzip();
        Self {
            boundaries,
            segment_chords,
        }
    }

    /// Sorted, unique boundary ticks
    pub fn boundaries(&self) -> &[u32] {
        &self.boundaries
    }

    /// One chord per boundary
    pub fn segment_chords(&self) -> &[Option<DetectedChord>] {
        &self.segment_chords
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    /// True without boundaries
    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// `(start, end, chord)` for every segment, the last ending at `clip_end`.
    pub fn segments(&self, clip_end: u32) -> impl Iterator<Item = (u32, u32, Option<&DetectedChord>)> {
        self.boundaries
            .iter()
            .enumerate()
            .map(move |(i, start)| {
                let end = self.boundaries.get(i + 1).copied().unwrap_or(clip_end);
                (*start, end.max(*start), self.segment_chords[i].as_ref())
            })
    }

    /// Flattens per-bar state. Every bar contributes its bar start; segmented
    /// bars contribute each segment start.
    pub fn from_bars(bars: &[BarChordInfo], ticks_per_bar: u32) -> Self {
        let segments = bars
            .iter()
            .flat_map(|bar| {
                let (bar_start, _) = bar_span(bar.bar_index, ticks_per_bar);
                bar.as_segments(ticks_per_bar)
                    .into_iter()
                    .map(move |s| (bar_start.saturating_add(s.start_tick), s.chord))
            })
            .collect();
        Self::new(segments)
    }

    /// Lays the segmentation over freshly extracted bars.
    ///
    /// Each bar is cut at the boundaries that fall inside it. A bar covered by
    /// a single segment becomes whole-bar with that segment's chord; otherwise
    /// it becomes segmented. Bars before the first boundary are left as they
    /// are. Pitch classes always come from `bars`.
    pub fn to_bars(&self, bars: &[BarChordInfo], ticks_per_bar: u32) -> Vec<BarChordInfo> {
        let (clip_end, _) = bar_span(bars.len(), ticks_per_bar);
        let spans: Vec<(u32, u32, Option<&DetectedChord>)> = self.segments(clip_end).collect();

        bars.iter()
            .map(|bar| {
                let (bar_start, bar_end) = bar_span(bar.bar_index, ticks_per_bar);
                let mut segments: Vec<Segment> = spans
                    .iter()
                    .filter(|(start, end, _)| *start < bar_end && *end > bar_start)
                    .map(|(start, end, chord)| {
                        Segment::new(
                            start.max(&bar_start) - bar_start,
                            end.min(&bar_end) - bar_start,
                            chord.cloned(),
                        )
                    })
                    .collect();
                let Some(first) = segments.first_mut() else {
                    return bar.clone();
                };
                if first.start_tick > 0 {
                    // the bar opens before the first boundary
                    first.start_tick = 0;
                }
                match segments.as_slice() {
                    [only] => BarChordInfo::whole(
                        bar.bar_index,
                        only.chord.clone(),
                        bar.pitch_classes.clone(),
                    ),
                    _ => BarChordInfo {
                        segments: Some(segments),
                        ..bar.clone()
                    },
                }
            })
            .collect()
    }
}
