#![warn(missing_docs)]
#![doc = r#"
Chord records from loop containers, Standard MIDI File round-tripping and
bar-level harmonic segmentation.

The crate reads three things:

- **Loop containers** (AIFF/AIFC and CAF). Their chunk streams are walked into
  [`container::Chunk`]s, which yield an embedded Standard MIDI File and
  32-byte chord-annotation records ([`record::ChordRecord`]).
- **Standard MIDI Files**, parsed by [`file::MidiFile`] and written by
  [`file::SmfWriter`].
- **Embedded metadata** ([`protocol`]) riding on text and marker meta events:
  segmentation boundaries, chord labels and lead sheets.

Notes are analysed by [`harmony::extract`], which matches pitch-class sets
against chord templates per bar. User edits to bar chords go through
[`splice`], which keeps a bar's segments a partition of the bar and carries
them across re-extraction.

[`import`] ties the pieces together.

# Example
```rust
use loopchord::prelude::*;

let notes = [
    NoteEvent::new(48, 0, 1920, 90),
    NoteEvent::new(52, 0, 1920, 90),
    NoteEvent::new(55, 0, 1920, 90),
];
let config = AnalysisConfig::default();
let analysis = extract(&notes, 480, &config);
let bars = override_range(
    &analysis.harmonic.bar_chords,
    960,
    1920,
    parse_chord_symbol("Am"),
    &notes,
    config.ticks_per_bar(480),
);

let bytes = export_midi(&notes, &bars, &ExportConfig::default(), &config).unwrap();
let back = import_midi(&bytes, &config).unwrap();
assert_eq!(back.bars(), bars.as_slice());
```
"#]

pub mod config;
pub mod container;
pub mod file;
pub mod harmony;
pub mod import;
pub mod note;
pub mod protocol;
pub mod reader;
pub mod record;
pub mod splice;

mod error;
pub use error::*;

/// Commonly used types and functions.
pub mod prelude {
    pub use crate::{
        Error, FormatError, ParseError, ProtocolError, config::*, container::*, file::*,
        harmony::*, import::*, note::*, protocol::*, reader::ReaderError, record::*, splice::*,
    };
}
