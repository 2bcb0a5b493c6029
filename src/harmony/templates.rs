#![doc = r#"
Chord-quality templates.

A template is a root-relative pitch-class set. The table order is significant:
it is the last tie-break when two candidates are otherwise equal, so plainer
qualities come first.

| key      | intervals         |
|----------|-------------------|
| maj      | 0 4 7             |
| min      | 0 3 7             |
| 7        | 0 4 7 10          |
| maj7     | 0 4 7 11          |
| 6add9    | 0 2 4 7 9         |
"#]

/// A named chord quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChordQuality {
    /// Short key used in symbols: `C` + `maj` = `Cmaj`.
    pub key: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Root-relative pitch classes, ascending, starting at 0.
    pub intervals: &'static [u8],
    /// Other suffixes accepted when parsing a symbol.
    pub aliases: &'static [&'static str],
}

impl ChordQuality {
    /// The 12-bit set of this template's intervals.
    pub fn mask(&self) -> u16 {
        self.intervals.iter().fold(0, |acc, i| acc | 1 << i)
    }

    /// True if `suffix` names this quality.
    pub fn accepts(&self, suffix: &str) -> bool {
        self.key == suffix || self.aliases.contains(&suffix)
    }
}

macro_rules! quality {
    ($key:literal, $name:literal, [$($i:literal),*], [$($alias:literal),*]) => {
        ChordQuality {
            key: $key,
            name: $name,
            intervals: &[$($i),*],
            aliases: &[$($alias),*],
        }
    };
}

/// Every quality the matcher knows about.
pub const TEMPLATES: &[ChordQuality] = &[
    quality!("maj", "major", [0, 4, 7], ["", "M", "major"]),
    quality!("min", "minor", [0, 3, 7], ["m", "-", "minor"]),
    quality!("dim", "diminished", [0, 3, 6], ["°", "o"]),
    quality!("aug", "augmented", [0, 4, 8], ["+"]),
    quality!("sus2", "suspended second", [0, 2, 7], []),
    quality!("sus4", "suspended fourth", [0, 5, 7], ["sus"]),
    quality!("7", "dominant seventh", [0, 4, 7, 10], ["dom7"]),
    quality!("maj7", "major seventh", [0, 4, 7, 11], ["M7", "Δ", "Δ7"]),
    quality!("min7", "minor seventh", [0, 3, 7, 10], ["m7", "-7"]),
    quality!("m7b5", "half-diminished seventh", [0, 3, 6, 10], ["ø", "ø7", "min7b5"]),
    quality!("dim7", "diminished seventh", [0, 3, 6, 9], ["°7", "o7"]),
    quality!("minmaj7", "minor major seventh", [0, 3, 7, 11], ["mM7", "mmaj7"]),
    quality!("6", "major sixth", [0, 4, 7, 9], ["maj6"]),
    quality!("min6", "minor sixth", [0, 3, 7, 9], ["m6"]),
    quality!("add9", "added ninth", [0, 2, 4, 7], ["add2"]),
    quality!("minadd9", "minor added ninth", [0, 2, 3, 7], ["madd9"]),
    quality!("7sus4", "dominant seventh suspended fourth", [0, 5, 7, 10], ["7sus"]),
    quality!("9", "dominant ninth", [0, 2, 4, 7, 10], []),
    quality!("maj9", "major ninth", [0, 2, 4, 7, 11], ["M9"]),
    quality!("min9", "minor ninth", [0, 2, 3, 7, 10], ["m9"]),
    quality!("6add9", "six-nine", [0, 2, 4, 7, 9], ["6/9", "69"]),
];

/// The quality whose template is exactly `intervals`.
pub fn quality_for_intervals(intervals: &[u8]) -> Option<&'static ChordQuality> {
    TEMPLATES.iter().find(|q| q.intervals == intervals)
}

/// The quality named by `suffix` (key or alias).
pub fn quality_for_suffix(suffix: &str) -> Option<&'static ChordQuality> {
    TEMPLATES.iter().find(|q| q.accepts(suffix))
}

#[test]
fn templates_are_rooted_and_ascending() {
    for quality in TEMPLATES {
        assert_eq!(quality.intervals[0], 0, "{}", quality.key);
        assert!(
            quality.intervals.windows(2).all(|w| w[0] < w[1] && w[1] < 12),
            "{}",
            quality.key
        );
    }
}

#[test]
fn keys_and_aliases_are_unique() {
    let mut seen = std::collections::HashSet::new();
    for quality in TEMPLATES {
        assert!(seen.insert(quality.key), "{}", quality.key);
        for alias in quality.aliases {
            assert!(seen.insert(alias), "{alias}");
        }
    }
}
