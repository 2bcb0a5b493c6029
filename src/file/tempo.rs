use core::fmt;

/// Microseconds per quarter note, as carried by the `FF 51` meta event.
///
/// # Example
/// ```rust
/// # use loopchord::prelude::*;
/// let tempo = Tempo::from_bpm(120.0);
/// assert_eq!(tempo.micros_per_quarter(), 500_000);
/// assert_eq!(tempo.to_bytes(), [0x07, 0xA1, 0x20]);
/// ```
#[derive(PartialEq, Eq, PartialOrd, Ord, Debug, Clone, Copy, Hash)]
pub struct Tempo(u32);

impl Tempo {
    /// The largest value the 24-bit payload can hold.
    pub const MAX_MICROS: u32 = 0x00FF_FFFF;

    /// 120 BPM, the SMF default when no tempo event is present.
    pub const DEFAULT: Self = Self(500_000);

    /// Creates a tempo from microseconds per quarter note, clamped to 24 bits.
    pub const fn new(micros_per_quarter: u32) -> Self {
        if micros_per_quarter > Self::MAX_MICROS {
            Self(Self::MAX_MICROS)
        } else {
            Self(micros_per_quarter)
        }
    }

    /// bpm -> us per quarter
    pub fn from_bpm(bpm: f64) -> Self {
        if !bpm.is_finite() || bpm <= 0.0 {
            return Self::DEFAULT;
        }
        Self::new((60_000_000.0 / bpm).round().clamp(1.0, f64::from(Self::MAX_MICROS)) as u32)
    }

    /// Returns the microseconds per quarter note
    pub const fn micros_per_quarter(&self) -> u32 {
        self.0
    }

    /// Returns quarter notes per minute
    pub fn bpm(&self) -> f64 {
        60_000_000.0 / f64::from(self.0.max(1))
    }

    /// Decodes the three payload bytes of a tempo event.
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        Self(u32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]))
    }

    /// The three payload bytes of a tempo event.
    pub const fn to_bytes(&self) -> [u8; 3] {
        let [_, a, b, c] = self.0.to_be_bytes();
        [a, b, c]
    }
}

impl Default for Tempo {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Tempo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} bpm", self.bpm())
    }
}

#[test]
fn odd_tempos_survive_the_payload() {
    let tempo = Tempo::from_bpm(93.0);
    assert_eq!(tempo.micros_per_quarter(), 645_161);
    assert_eq!(Tempo::from_bytes(tempo.to_bytes()), tempo);
    assert!((tempo.bpm() - 93.0).abs() < 0.001);
}

#[test]
fn nonsense_bpm_falls_back_to_default() {
    assert_eq!(Tempo::from_bpm(0.0), Tempo::DEFAULT);
    assert_eq!(Tempo::from_bpm(f64::NAN), Tempo::DEFAULT);
    assert_eq!(Tempo::new(u32::MAX).micros_per_quarter(), Tempo::MAX_MICROS);
}
