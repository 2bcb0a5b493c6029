#![doc = r#"
Per-bar chord state under user edits.

A bar is either whole-bar or segmented (see
[`BarChordInfo`](crate::harmony::BarChordInfo)). Two edits move between the
states:

- **Override** ([`override_bar`], [`override_range`]) relabels a tick range.
  Overlapped segments are clipped, one segment is inserted, neighbours with the
  same chord are merged, segments without a sounding note are pruned into
  their neighbours, and a bar left with one bar-wide segment collapses back to
  whole-bar. If only rests remain, the bar's pre-edit chord is restored.
- **Substitute** ([`substitute`]) rewrites the notes in a range to the new
  chord's tones and re-extracts everything. The fresh extraction has no
  segments, so [`merge_bars`] carries the previous bar state forward: bars
  outside the range are kept verbatim, bars touching it get the override
  applied to their *previous* segments.

Every operation returns new values; inputs are never mutated.

# Example
```rust
# use loopchord::prelude::*;
let x = parse_chord_symbol("C");
let y = parse_chord_symbol("F");
let notes = [NoteEvent::new(48, 0, 1920, 90)];
let bar = BarChordInfo::whole(0, x.clone(), vec![0, 4, 7]);

let split = override_bar(&bar, 0, 960, y.clone(), &notes, 1920);
assert_eq!(
    split.segments,
    Some(vec![Segment::new(0, 960, y), Segment::new(960, 1920, x.clone())])
);

let back = override_bar(&split, 0, 960, x.clone(), &notes, 1920);
assert!(!back.is_segmented());
assert_eq!(back.chord, x);
```
"#]

mod bar;
pub use bar::*;

mod edit;
pub use edit::*;

mod segmentation;
pub use segmentation::*;
