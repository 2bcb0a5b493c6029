use crate::{
    harmony::{BarChordInfo, DetectedChord, Segment, bar_span},
    note::NoteEvent,
};

/// True if `segments` partitions `[0, ticks_per_bar)` into non-empty,
/// contiguous, ascending ranges.
pub fn is_partition(segments: &[Segment], ticks_per_bar: u32) -> bool {
    let Some(first) = segments.first() else {
        return false;
    };
    first.start_tick == 0
        && segments.iter().all(|s| s.start_tick < s.end_tick)
        && segments.windows(2).all(|w| w[0].end_tick == w[1].start_tick)
        && segments.last().is_some_and(|s| s.end_tick == ticks_per_bar)
}

/// Clips every segment overlapping `[start, end)` and inserts one segment for
/// the range. `start`/`end` must already lie within the bar.
pub fn splice_segment(
    segments: &[Segment],
    start: u32,
    end: u32,
    chord: Option<DetectedChord>,
) -> Vec<Segment> {
    let mut before = Vec::new();
    let mut after = Vec::new();
    for segment in segments {
        if segment.start_tick < start {
            before.push(Segment::new(
                segment.start_tick,
                segment.end_tick.min(start),
                segment.chord.clone(),
            ));
        }
        if segment.end_tick > end {
            after.push(Segment::new(
                segment.start_tick.max(end),
                segment.end_tick,
                segment.chord.clone(),
            ));
        }
    }
    before.push(Segment::new(start, end, chord));
    before.extend(after);
    before
}

/// Joins neighbours that carry the same chord.
pub fn merge_equal_neighbours(segments: Vec<Segment>) -> Vec<Segment> {
    let mut merged: Vec<Segment> = Vec::with_capacity(segments.len());
    for segment in segments {
        match merged.last_mut() {
            Some(last) if last.chord == segment.chord && last.end_tick == segment.start_tick => {
                last.end_tick = segment.end_tick;
            }
            _ => merged.push(segment),
        }
    }
    merged
}

/// Removes segments with no sounding note. The preceding segment grows over a
/// pruned range; a leading rest is absorbed by the segment after it.
///
/// `bar_start` is the absolute tick of the bar, `notes` are absolute.
pub fn prune_rests(segments: Vec<Segment>, bar_start: u32, notes: &[NoteEvent]) -> Vec<Segment> {
    let mut kept: Vec<Segment> = Vec::with_capacity(segments.len());
    let mut leading_rest: Option<u32> = None;
    for segment in segments {
        let sounding = notes.iter().any(|n| {
            n.overlaps(
                bar_start.saturating_add(segment.start_tick),
                bar_start.saturating_add(segment.end_tick),
            )
        });
        if sounding {
            let mut segment = segment;
            if let Some(start) = leading_rest.take() {
                segment.start_tick = start;
            }
            kept.push(segment);
        } else if let Some(last) = kept.last_mut() {
            last.end_tick = segment.end_tick;
        } else {
            leading_rest.get_or_insert(segment.start_tick);
        }
    }
    kept
}

/// Applies an override of `[start, end)` (relative to the bar) to one bar.
///
/// The range is clipped to the bar. Overlapped segments are clipped, one
/// segment is inserted, equal neighbours are merged, rests are pruned and a
/// single bar-wide segment collapses to the whole-bar state. If nothing but
/// rests remains, the bar's pre-edit chord is restored.
pub fn override_bar(
    bar: &BarChordInfo,
    start: u32,
    end: u32,
    chord: Option<DetectedChord>,
    notes: &[NoteEvent],
    ticks_per_bar: u32,
) -> BarChordInfo {
    let start = start.min(ticks_per_bar);
    let end = end.min(ticks_per_bar);
    if start >= end {
        return bar.clone();
    }

    let prior = bar.as_segments(ticks_per_bar);
    debug_assert!(
        is_partition(&prior, ticks_per_bar),
        "bar {} segments do not partition the bar: {prior:?}",
        bar.bar_index
    );

    let spliced = merge_equal_neighbours(splice_segment(&prior, start, end, chord));
    let (bar_start, _) = bar_span(bar.bar_index, ticks_per_bar);
    let pruned = merge_equal_neighbours(prune_rests(spliced, bar_start, notes));

    if pruned.is_empty() {
        tracing::debug!(bar = bar.bar_index, "every segment was a rest, restoring bar chord");
        return BarChordInfo::whole(bar.bar_index, bar.chord.clone(), bar.pitch_classes.clone());
    }
    debug_assert!(is_partition(&pruned, ticks_per_bar), "{pruned:?}");
    collapse(bar, pruned, ticks_per_bar)
}

fn collapse(bar: &BarChordInfo, segments: Vec<Segment>, ticks_per_bar: u32) -> BarChordInfo {
    match segments.as_slice() {
        [only] if only.start_tick == 0 && only.end_tick == ticks_per_bar => {
            BarChordInfo::whole(bar.bar_index, only.chord.clone(), bar.pitch_classes.clone())
        }
        _ => BarChordInfo {
            bar_index: bar.bar_index,
            chord: bar.chord.clone(),
            pitch_classes: bar.pitch_classes.clone(),
            segments: Some(segments),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harmony::parse_chord_symbol;
    use pretty_assertions::assert_eq;

    fn chord(symbol: &str) -> Option<DetectedChord> {
        parse_chord_symbol(symbol)
    }

    #[test]
    fn splice_clips_both_sides() {
        let segments = vec![
            Segment::new(0, 960, chord("C")),
            Segment::new(960, 1920, chord("G")),
        ];
        let spliced = splice_segment(&segments, 480, 1440, chord("F"));
        assert_eq!(
            spliced,
            vec![
                Segment::new(0, 480, chord("C")),
                Segment::new(480, 1440, chord("F")),
                Segment::new(1440, 1920, chord("G")),
            ]
        );
        assert!(is_partition(&spliced, 1920));
    }

    #[test]
    fn splice_inside_one_segment_keeps_both_halves() {
        let segments = vec![Segment::new(0, 1920, chord("C"))];
        let spliced = splice_segment(&segments, 480, 960, chord("F"));
        assert_eq!(spliced.len(), 3);
        assert_eq!(spliced[2], Segment::new(960, 1920, chord("C")));
    }

    #[test]
    fn rests_are_absorbed_by_neighbours() {
        let notes = [NoteEvent::new(60, 2500, 300, 90), NoteEvent::new(64, 3000, 300, 90)];
        // bar 1 starts at 1920
        let segments = vec![
            Segment::new(0, 480, chord("C")),
            Segment::new(480, 960, chord("F")),
            Segment::new(960, 1440, chord("G")),
            Segment::new(1440, 1920, chord("A")),
        ];
        assert_eq!(
            prune_rests(segments, 1920, &notes),
            vec![
                Segment::new(0, 960, chord("F")),
                Segment::new(960, 1920, chord("G")),
            ]
        );
    }

    #[test]
    fn all_rests_restore_the_bar_chord() {
        let bar = BarChordInfo::whole(0, chord("Am"), vec![]);
        let edited = override_bar(&bar, 0, 960, chord("D"), &[], 1920);
        assert_eq!(edited, bar);
    }

    #[test]
    fn empty_or_outside_ranges_are_ignored() {
        let bar = BarChordInfo::whole(0, chord("C"), vec![0, 4, 7]);
        let notes = [NoteEvent::new(60, 0, 1920, 90)];
        assert_eq!(override_bar(&bar, 960, 960, chord("D"), &notes, 1920), bar);
        assert_eq!(override_bar(&bar, 2000, 2400, chord("D"), &notes, 1920), bar);
    }
}
