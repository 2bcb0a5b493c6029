use loopchord::prelude::*;
use pretty_assertions::assert_eq;

const BAR: u32 = 1920;

fn chord(symbol: &str) -> Option<DetectedChord> {
    parse_chord_symbol(symbol)
}

fn block(start: u32, len: u32, pitches: &[u8]) -> Vec<NoteEvent> {
    pitches
        .iter()
        .map(|p| NoteEvent::new(*p, start, len, 100))
        .collect()
}

#[test]
fn split_and_collapse() {
    let x = chord("Cmaj7");
    let y = chord("Fmaj7");
    let notes = block(0, BAR, &[48, 52, 55, 59]);
    let bar = BarChordInfo::whole(0, x.clone(), vec![0, 4, 7, 11]);

    let split = override_bar(&bar, 0, 960, y.clone(), &notes, BAR);
    assert_eq!(
        split.segments,
        Some(vec![
            Segment::new(0, 960, y.clone()),
            Segment::new(960, BAR, x.clone()),
        ])
    );
    assert_eq!(split.chord_at(100), y.as_ref());
    assert_eq!(split.chord_at(1000), x.as_ref());

    let back = override_bar(&split, 0, 960, x.clone(), &notes, BAR);
    assert_eq!(back, bar);

    let whole = override_bar(&split, 0, BAR, y.clone(), &notes, BAR);
    assert_eq!(whole, BarChordInfo::whole(0, y, vec![0, 4, 7, 11]));
}

#[test]
fn reapplying_the_remaining_chord_keeps_the_split() {
    let x = chord("Cmaj7");
    let y = chord("Fmaj7");
    let notes = block(0, BAR, &[48, 52, 55, 59]);
    let bar = BarChordInfo::whole(0, x.clone(), vec![0, 4, 7, 11]);

    let split = override_bar(&bar, 0, 960, y.clone(), &notes, BAR);
    // the second half already carries X, so nothing collapses
    let again = override_bar(&split, 960, BAR, x.clone(), &notes, BAR);
    assert_eq!(again, split);
    assert_eq!(
        again.segments,
        Some(vec![Segment::new(0, 960, y), Segment::new(960, BAR, x)])
    );
}

#[test]
fn overrides_over_rests_fold_into_neighbours() {
    // sound only in the first half of the bar
    let notes = block(0, 960, &[50, 53, 57]);
    let bar = BarChordInfo::whole(0, chord("Dm"), vec![2, 5, 9]);

    let edited = override_bar(&bar, 960, BAR, chord("G"), &notes, BAR);
    assert_eq!(edited, bar);

    let edited = override_bar(&bar, 480, 1440, chord("Bb"), &notes, BAR);
    assert_eq!(
        edited.segments,
        Some(vec![
            Segment::new(0, 480, chord("Dm")),
            Segment::new(480, BAR, chord("Bb")),
        ])
    );
}

#[test]
fn silent_bar_keeps_its_chord() {
    let bar = BarChordInfo::whole(2, chord("E"), vec![]);
    let edited = override_bar(&bar, 0, 960, chord("A"), &[], BAR);
    assert_eq!(edited, bar);
}

#[test]
fn substitution_keeps_prior_segments() {
    let mut notes = block(0, BAR, &[48, 52, 55]);
    notes.extend(block(BAR, 960, &[45, 48, 52]));
    notes.extend(block(BAR + 960, 960, &[43, 47, 50]));
    let config = AnalysisConfig::default();

    let fresh = extract(&notes, 480, &config);
    let prior = override_range(
        &fresh.harmonic.bar_chords,
        BAR + 960,
        2 * BAR,
        chord("G"),
        &notes,
        BAR,
    );
    assert!(prior[1].is_segmented());

    // substitute F over the first half of bar 1
    let f = chord("F").unwrap();
    let result = substitute(&notes, &prior, BAR, BAR + 960, &f, 480, &config);

    let bars = result.bars();
    assert_eq!(bars[0], prior[0]);
    assert_eq!(
        bars[1].segments,
        Some(vec![
            Segment::new(0, 960, Some(f.clone())),
            Segment::new(960, BAR, chord("G")),
        ])
    );
    // A C E revoiced voice by voice to F A C
    let revoiced: Vec<u8> = result
        .notes()
        .iter()
        .filter(|n| n.start_tick == BAR)
        .map(|n| n.pitch)
        .collect();
    assert_eq!(revoiced, vec![41, 45, 48]);
    // pitch classes come from the revoiced notes
    assert_eq!(bars[1].pitch_classes, vec![0, 2, 5, 7, 9, 11]);
}

#[test]
fn segmentation_survives_the_bar_model() {
    let bars = vec![
        BarChordInfo::whole(0, chord("C"), vec![]),
        BarChordInfo {
            bar_index: 1,
            chord: chord("F"),
            pitch_classes: vec![],
            segments: Some(vec![
                Segment::new(0, 1440, chord("F")),
                Segment::new(1440, BAR, chord("G")),
            ]),
        },
    ];
    let segmentation = Segmentation::from_bars(&bars, BAR);
    assert_eq!(segmentation.boundaries(), &[0, 1920, 3360]);
    let json = serde_json::to_string(&segmentation).unwrap();
    let back: Segmentation = serde_json::from_str(&json).unwrap();
    assert_eq!(back.to_bars(&bars, BAR), bars);
}

#[test]
fn bars_at_the_end_of_the_tick_range() {
    // the fifth bar would end past u32::MAX and is cut short
    let config = AnalysisConfig {
        beats_per_bar: 16384,
        ..AnalysisConfig::default()
    };
    let ticks_per_bar = config.ticks_per_bar(u16::MAX);
    let notes = [NoteEvent::new(60, u32::MAX - 100, 50, 90)];

    let analysis = extract(&notes, u16::MAX, &config);
    assert_eq!(analysis.gesture.bar_count, 5);
    assert_eq!(analysis.gesture.onset_density, 0.2);
    assert_eq!(bar_span(4, ticks_per_bar), (4 * ticks_per_bar, u32::MAX));
    assert_eq!(analysis.harmonic.bar_chords[4].pitch_classes, vec![0]);

    let bars = override_range(
        &analysis.harmonic.bar_chords,
        u32::MAX - 200,
        u32::MAX,
        chord("C"),
        &notes,
        ticks_per_bar,
    );
    assert_eq!(bars[4], BarChordInfo::whole(4, chord("C"), vec![0]));
    assert_eq!(&bars[..4], &analysis.harmonic.bar_chords[..4]);

    let segmentation = Segmentation::from_bars(&bars, ticks_per_bar);
    assert_eq!(segmentation.to_bars(&bars, ticks_per_bar), bars);
}
