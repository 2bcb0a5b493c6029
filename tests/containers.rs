use loopchord::prelude::*;
use pretty_assertions::assert_eq;

fn aiff_chunk(tag: &[u8; 4], data: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(data);
    if data.len() % 2 == 1 {
        out.push(0);
    }
    out
}

fn aiff(chunks: &[Vec<u8>]) -> Vec<u8> {
    let body: Vec<u8> = chunks.concat();
    let mut out = b"FORM".to_vec();
    out.extend_from_slice(&(body.len() as u32 + 4).to_be_bytes());
    out.extend_from_slice(b"AIFF");
    out.extend(body);
    out
}

fn caf(chunks: &[(&[u8; 4], &[u8])]) -> Vec<u8> {
    let mut out = b"caff\x00\x01\x00\x00".to_vec();
    for (tag, data) in chunks {
        out.extend_from_slice(*tag);
        out.extend_from_slice(&(data.len() as u64).to_be_bytes());
        out.extend_from_slice(data);
    }
    out
}

fn record(mask: u16, discriminant: u8, root: u8, position: u16, fraction: u8) -> Vec<u8> {
    let mut raw = vec![0u8; 32];
    raw[0..2].copy_from_slice(&CHORD_RECORD_TYPE.to_le_bytes());
    raw[4..6].copy_from_slice(&mask.to_le_bytes());
    raw[8] = discriminant;
    raw[9] = root;
    raw[0x18] = fraction;
    raw[0x19..0x1b].copy_from_slice(&position.to_le_bytes());
    raw
}

fn midi() -> Vec<u8> {
    SmfWriter::new(480)
        .with_notes(&[
            NoteEvent::new(45, 0, 1920, 90),
            NoteEvent::new(60, 0, 1920, 90),
            NoteEvent::new(64, 0, 1920, 90),
        ])
        .to_bytes()
}

#[test]
fn aiff_annotations_in_nested_application_chunks() {
    let mut payload = record(0b0000_1000_1001, 2, 9, 15, 0); // A minor at 0
    payload.extend(record(0, 0, 0, 17, 0)); // bookmark
    payload.extend(record(0b0000_1001_0001, 2, 5, 17, 0)); // F major, two units in
    let mut appl = b"mcra".to_vec();
    appl.extend(aiff_chunk(b"Sequ", &payload));

    let bytes = aiff(&[
        aiff_chunk(b"COMM", &[0; 18]),
        aiff_chunk(b"APPL", &appl),
        aiff_chunk(b"MIDI", &midi()),
    ]);
    let container = LoopContainer::parse(&bytes, &DecodeConfig::default()).unwrap();
    let tags: Vec<String> = container.chunks().iter().map(Chunk::tag).collect();
    assert_eq!(tags, vec!["COMM", "APPL", "Sequ", "MIDI"]);
    assert_eq!(container.find(b"Sequ").unwrap().depth(), 1);

    let import = import_loop(&bytes, &DecodeConfig::default(), &AnalysisConfig::default()).unwrap();
    let symbols: Vec<(u32, String)> = import
        .chords
        .iter()
        .map(|c| (c.event.tick(), c.symbol()))
        .collect();
    assert_eq!(
        symbols,
        vec![(0, "Amin".to_string()), (256, "Fmaj".to_string())]
    );
    assert!(matches!(import.chords[1].root, RootResolution::Decoded(_)));
    assert_eq!(
        import.analysis.unwrap().harmonic.chord.unwrap().symbol,
        "Amin"
    );
}

#[test]
fn caf_with_unsized_data_chunk() {
    let mut bytes = caf(&[(b"desc", &[0; 32]), (b"Sequ", &record(0b1001_0001, 3, 6, 15, 0))]);
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&u64::MAX.to_be_bytes());
    bytes.extend_from_slice(&[0x55; 100]);

    let import = import_loop(&bytes, &DecodeConfig::default(), &AnalysisConfig::default()).unwrap();
    assert_eq!(import.kind, ContainerKind::Caf);
    assert_eq!(import.midi_source, None);
    assert_eq!(import.chords[0].symbol(), "F♯maj");
}

#[test]
fn midi_found_by_magic_scan() {
    let mut data = vec![0u8; 10];
    data.extend(midi());
    let bytes = aiff(&[aiff_chunk(b"ANON", &data)]);
    let container = LoopContainer::parse(&bytes, &DecodeConfig::default()).unwrap();
    let embedded = container.embedded_midi(&DecodeConfig::default()).unwrap();
    assert_eq!(embedded.source, MidiSource::MagicScan);
    assert_eq!(embedded.offset, 12 + 8 + 10);
    // everything to the end of the buffer is taken
    assert_eq!(embedded.bytes.len(), bytes.len() - embedded.offset);

    let import = import_loop(&bytes, &DecodeConfig::default(), &AnalysisConfig::default()).unwrap();
    assert_eq!(import.analysis.unwrap().notes.len(), 3);
}

#[test]
fn truncated_container_keeps_leading_chunks() {
    let mut bytes = aiff(&[
        aiff_chunk(b"COMM", &[0; 18]),
        aiff_chunk(b"Sequ", &record(0b1001_0001, 2, 0, 15, 0)),
    ]);
    bytes.extend_from_slice(b"SSND");
    bytes.extend_from_slice(&100_000u32.to_be_bytes());
    bytes.extend_from_slice(&[0; 16]);

    let container = LoopContainer::parse(&bytes, &DecodeConfig::default()).unwrap();
    assert_eq!(container.chunks().len(), 2);
    let import = import_loop(&bytes, &DecodeConfig::default(), &AnalysisConfig::default()).unwrap();
    assert_eq!(import.chords[0].symbol(), "Cmaj");
}

#[test]
fn unknown_magic_is_fatal() {
    let error = import_loop(
        b"RIFF\x10\x00\x00\x00WAVEfmt ",
        &DecodeConfig::default(),
        &AnalysisConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        error,
        Error::Format(FormatError::UnrecognizedMagic(magic)) if &magic == b"RIFF"
    ));
}

#[test]
fn positions_rescale_to_the_target_grid() {
    let bytes = aiff(&[aiff_chunk(b"Sequ", &record(0b1001_0001, 2, 0, 16, 64))]);
    let config = DecodeConfig::default().with_target_ppq(960);
    let import = import_loop(&bytes, &config, &AnalysisConfig::default()).unwrap();
    // (16 - 15) * 128 + 64 / 2 = 160 at 480, 320 at 960
    assert_eq!(import.chords[0].event.tick(), 320);
    assert_eq!(import.chords[0].event.position_beats(), 1.0 / 3.0);
}

#[test]
fn embedded_midi_with_an_overlong_track_is_still_read() {
    let mut smf = midi();
    let declared = u32::from_be_bytes([smf[18], smf[19], smf[20], smf[21]]) + 1;
    smf[18..22].copy_from_slice(&declared.to_be_bytes());
    let bytes = aiff(&[
        aiff_chunk(b"Sequ", &record(0b1000_1001, 2, 9, 15, 0)),
        aiff_chunk(b"MIDI", &smf),
    ]);

    let import = import_loop(&bytes, &DecodeConfig::default(), &AnalysisConfig::default()).unwrap();
    assert_eq!(import.midi_source, Some(MidiSource::Chunk { id: *b"MIDI" }));
    assert_eq!(import.analysis.unwrap().notes.len(), 3);
}
