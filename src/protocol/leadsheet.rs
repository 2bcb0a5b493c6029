use serde::{Deserialize, Serialize};

use crate::harmony::{DetectedChord, parse_chord_symbol};

/// One chord of a lead-sheet bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadsheetChord {
    /// The symbol as written
    pub chord: String,
    /// Index within the bar
    pub position: usize,
    /// Number of chords in the bar
    pub total_in_bar: usize,
    /// Offset from bar start, in beats
    pub beat_position: f64,
    /// Length in beats
    pub duration: f64,
}

impl LeadsheetChord {
    /// The chord the symbol names, if it parses.
    pub fn detected(&self) -> Option<DetectedChord> {
        parse_chord_symbol(&self.chord)
    }
}

/// One bar of a lead sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadsheetBar {
    /// Chords, tiling the bar in equal parts
    pub chords: Vec<LeadsheetChord>,
}

#[doc = r#"
A per-bar chord chart, independent of the notes.

Bars are separated by `|` and chords within a bar by whitespace. `%` (or an
empty bar) repeats the previous bar. A chart of a single bar with a declared
bar count above one is repeated across every bar. Chords within a bar share it
equally.

# Example
```rust
# use loopchord::prelude::*;
let sheet = Leadsheet::parse("C | F G | %", None, 4);
assert_eq!(sheet.bars.len(), 3);
assert_eq!(sheet.bars[2], sheet.bars[1]);
assert_eq!(sheet.bars[1].chords[1].beat_position, 2.0);

let vamp = Leadsheet::parse("C6add9", Some(4), 4);
assert_eq!(vamp.bars.len(), 4);
```
"#]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Leadsheet {
    /// The chart as typed
    pub input_text: String,
    /// Parsed bars
    pub bars: Vec<LeadsheetBar>,
}

impl Leadsheet {
    /// Parses a chart. `bars` is the declared bar count, if known.
    pub fn parse(text: &str, bars: Option<usize>, beats_per_bar: u32) -> Self {
        let beats = f64::from(beats_per_bar.max(1));
        let mut parsed: Vec<LeadsheetBar> = Vec::new();

        for cell in text.trim().trim_matches('|').split('|') {
            let symbols: Vec<&str> = cell.split_whitespace().collect();
            let repeat = matches!(symbols.as_slice(), [] | ["%"]);
            if repeat {
                if let Some(previous) = parsed.last().cloned() {
                    parsed.push(previous);
                }
                continue;
            }
            let total = symbols.len();
            let duration = beats / total as f64;
            parsed.push(LeadsheetBar {
                chords: symbols
                    .iter()
                    .enumerate()
                    .map(|(position, chord)| LeadsheetChord {
                        chord: chord.to_string(),
                        position,
                        total_in_bar: total,
                        beat_position: position as f64 * duration,
                        duration,
                    })
                    .collect(),
            });
        }

        if let (Some(count), [single]) = (bars, parsed.as_slice()) {
            if count > 1 {
                parsed = vec![single.clone(); count];
            }
        }

        Self {
            input_text: text.to_string(),
            bars: parsed,
        }
    }
}
