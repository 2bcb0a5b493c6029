use loopchord::{
    ChunkError, HeaderError, ParseError, TrackError,
    file::TrackMessage,
    prelude::*,
    reader::ReaderErrorKind,
};
use pretty_assertions::assert_eq;

fn smf(format: u16, division: u16, tracks: &[&[u8]]) -> Vec<u8> {
    let mut out = b"MThd".to_vec();
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(&format.to_be_bytes());
    out.extend_from_slice(&(tracks.len() as u16).to_be_bytes());
    out.extend_from_slice(&division.to_be_bytes());
    for track in tracks {
        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(track);
    }
    out
}

fn parse_error(bytes: &[u8]) -> (usize, ParseError) {
    let error = MidiFile::parse(bytes).unwrap_err();
    let ReaderErrorKind::ParseError(parse) = error.error_kind() else {
        panic!("Error at {}, {:?}", error.position(), error);
    };
    (error.position(), parse.clone())
}

const CONDUCTOR: &[u8] = &[
    0x00, 0xFF, 0x51, 0x03, 0x09, 0x27, 0xC0, // tempo 600000
    0x00, 0xFF, 0x03, 0x04, b'L', b'e', b'a', b'd', // track name
    0x00, 0xFF, 0x2F, 0x00,
];

const PERFORMANCE: &[u8] = &[
    0x00, 0xC0, 0x05, // program change
    0x00, 0xF0, 0x03, 0x7E, 0x09, 0xF7, // sysex
    0x00, 0x90, 0x3C, 0x64, // C4 on
    0x00, 0x40, 0x50, // E4 on, running status
    0x83, 0x60, 0x3C, 0x00, // C4 off as velocity 0
    0x00, 0x40, 0x00, // E4 off
    0x00, 0xE0, 0x00, 0x40, // pitch bend
    0x00, 0xFF, 0x2F, 0x00,
];

#[test]
fn read_format_1() {
    let bytes = smf(1, 480, &[CONDUCTOR, PERFORMANCE]);
    let file = MidiFile::parse(&bytes).unwrap();

    assert_eq!(file.header().format_type(), FormatType::Simultaneous);
    assert_eq!(file.tracks().len(), 2);
    assert_eq!(file.tempo().micros_per_quarter(), 600_000);
    assert_eq!(file.tempo().bpm(), 100.0);
    assert_eq!(
        file.notes(),
        vec![NoteEvent::new(60, 0, 480, 100), NoteEvent::new(64, 0, 480, 80)]
    );
    assert_eq!(file.end_tick(), 480);

    let performance = file.tracks()[1].events();
    assert_eq!(
        performance[1].message(),
        &TrackMessage::SysEx([0x7E, 0x09, 0xF7].as_slice().into())
    );
    let names: Vec<String> = file
        .meta_events()
        .iter()
        .filter_map(|(_, meta)| meta.text_of(TextKind::TrackName))
        .map(|name| name.into_owned())
        .collect();
    assert_eq!(names, vec!["Lead".to_string()]);
}

#[test]
fn read_unterminated_note() {
    let track = [0x00, 0x90, 0x3C, 0x64, 0x87, 0x40, 0xFF, 0x2F, 0x00];
    let bytes = smf(0, 96, &[&track]);
    let file = MidiFile::parse(&bytes).unwrap();
    assert_eq!(file.notes(), vec![NoteEvent::new(60, 0, 960, 100)]);
}

#[test]
fn read_with_trailing_container_bytes() {
    let mut bytes = smf(0, 480, &[PERFORMANCE]);
    bytes.extend_from_slice(b"APPL\x00\x00\x00\x10garbage after the file");
    let file = MidiFile::parse(&bytes).unwrap();
    assert_eq!(file.notes().len(), 2);
}

#[test]
fn read_damaged_running_status() {
    let track = [0x00, 0x3C, 0x64];
    let bytes = smf(0, 480, &[&track]);
    assert_eq!(
        parse_error(&bytes),
        (23, ParseError::Track(TrackError::NoRunningStatus(0x3C)))
    );
}

#[test]
fn read_smpte_division() {
    let bytes = smf(0, 0xE728, &[PERFORMANCE]);
    assert_eq!(
        parse_error(&bytes),
        (12, ParseError::Header(HeaderError::SmpteTiming(0xE728)))
    );
}

#[test]
fn read_overlong_track() {
    let mut bytes = smf(0, 480, &[PERFORMANCE]);
    bytes.truncate(bytes.len() - 4);
    let (position, error) = parse_error(&bytes);
    assert_eq!(position, 18);
    assert!(matches!(
        error,
        ParseError::Chunk(ChunkError::SizeOverflow { .. })
    ));
}

#[test]
fn writer_output_reads_back() {
    let notes = [
        NoteEvent::new(48, 0, 1920, 70),
        NoteEvent::new(67, 480, 0, 90),
        NoteEvent::new(67, 480, 480, 95),
        NoteEvent::new(72, 960, 960, 127),
    ];
    let bytes = SmfWriter::new(480)
        .with_tempo(Tempo::from_bpm(87.0))
        .with_notes(&notes)
        .with_meta(480, MetaMessage::marker("chorus"))
        .to_bytes();
    let file = MidiFile::parse(&bytes).unwrap();

    let mut expected = notes.to_vec();
    expected.sort_by_key(|n| (n.start_tick, n.pitch, n.duration_ticks));
    assert_eq!(file.notes(), expected);
    assert_eq!(file.tempo(), Tempo::from_bpm(87.0));

    // the marker precedes the notes it annotates
    let at_480: Vec<&TrackMessage> = file.tracks()[0]
        .events()
        .iter()
        .filter(|e| e.tick() == 480)
        .map(|e| e.message())
        .collect();
    assert!(matches!(at_480[0], TrackMessage::Meta(MetaMessage::Text(TextKind::Marker, _))));
}
