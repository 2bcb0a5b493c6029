#![doc = r#"
Harmonic analysis: chord templates, the template matcher, chord symbols and
per-bar extraction.

# Example
```rust
# use loopchord::prelude::*;
let matched = match_pitches(&[57, 60, 64], &AnalysisConfig::default());
let chord = matched.chord.unwrap();
assert_eq!(chord.symbol, "Amin");
assert!(chord.extra_pitch_classes.is_empty());
```
"#]

mod chord;
pub use chord::*;

mod extract;
pub use extract::*;

mod matcher;
pub use matcher::*;

mod symbol;
pub use symbol::*;

pub mod templates;
