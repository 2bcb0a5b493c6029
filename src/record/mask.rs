use core::fmt;

#[doc = r#"
A 12-bit interval set. Bit *i* set means the tone *i* semitones above the root
is present.

# Example
```rust
# use loopchord::prelude::*;
let mask = IntervalMask::from_bits(0b1001_0001);
assert_eq!(mask.intervals(), vec![0, 4, 7]);
assert_eq!(IntervalMask::from_intervals(&[7, 0, 4]), mask);
```
"#]
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct IntervalMask(u16);

impl IntervalMask {
    /// Bits above the twelfth are ignored.
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & 0x0FFF)
    }

    /// Builds a mask from semitone offsets; offsets are reduced modulo 12.
    pub fn from_intervals(intervals: &[u8]) -> Self {
        Self(intervals.iter().fold(0, |acc, i| acc | 1 << (i % 12)))
    }

    /// The raw 12-bit value.
    pub const fn bits(&self) -> u16 {
        self.0
    }

    /// True if no interval is set.
    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if `semitone` is set.
    pub const fn contains(&self, semitone: u8) -> bool {
        semitone < 12 && self.0 & (1 << semitone) != 0
    }

    /// Set semitone offsets, strictly ascending.
    pub fn intervals(&self) -> Vec<u8> {
        (0..12).filter(|i| self.contains(*i)).collect()
    }
}

impl fmt::Debug for IntervalMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IntervalMask({:012b})", self.0)
    }
}

#[test]
fn every_mask_survives_decode_encode() {
    for bits in 0..0x1000u16 {
        let mask = IntervalMask::from_bits(bits);
        let intervals = mask.intervals();
        assert!(intervals.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(intervals.len(), bits.count_ones() as usize);
        assert_eq!(IntervalMask::from_intervals(&intervals).bits(), bits);
    }
}

#[test]
fn high_bits_are_dropped() {
    assert_eq!(IntervalMask::from_bits(0xF091).bits(), 0x091);
}
