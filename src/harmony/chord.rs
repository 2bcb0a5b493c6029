use core::fmt;

use serde::{Deserialize, Serialize};

use super::templates::ChordQuality;
use crate::note::PitchClass;

/// A chord recognised from a set of pitch classes.
///
/// Equality is by content. Pitch-class lists are ascending.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectedChord {
    /// Root, 0..12
    pub root_pitch_class: u8,
    /// Root spelling, e.g. `F♯`
    pub root_name: String,
    /// Quality key, e.g. `maj`
    pub quality_key: String,
    /// Root name + quality key
    pub symbol: String,
    /// Human-readable quality
    pub quality_name: String,
    /// Pitch classes that were actually sounding
    pub observed_pitch_classes: Vec<u8>,
    /// The template transposed to the root
    pub template_pitch_classes: Vec<u8>,
    /// Observed but not in the template
    pub extra_pitch_classes: Vec<u8>,
    /// In the template but not observed
    pub missing_pitch_classes: Vec<u8>,
    /// Lowest sounding pitch class, when it differs from the root
    pub bass_pitch_class: Option<u8>,
}

impl DetectedChord {
    /// Builds a chord from a root, a quality and what was observed.
    pub fn from_observation(
        root: PitchClass,
        root_name: &str,
        quality: &ChordQuality,
        observed: &[u8],
        bass: Option<PitchClass>,
    ) -> Self {
        let mut template: Vec<u8> = quality
            .intervals
            .iter()
            .map(|i| root.transpose(*i).value())
            .collect();
        template.sort_unstable();
        let mut observed = observed.to_vec();
        observed.sort_unstable();
        observed.dedup();

        let extra = observed
            .iter()
            .copied()
            .filter(|pc| !template.contains(pc))
            .collect();
        let missing = template
            .iter()
            .copied()
            .filter(|pc| !observed.contains(pc))
            .collect();

        Self {
            root_pitch_class: root.value(),
            root_name: root_name.to_string(),
            quality_key: quality.key.to_string(),
            symbol: format!("{root_name}{}", quality.key),
            quality_name: quality.name.to_string(),
            observed_pitch_classes: observed,
            template_pitch_classes: template,
            extra_pitch_classes: extra,
            missing_pitch_classes: missing,
            bass_pitch_class: bass.filter(|b| *b != root).map(|b| b.value()),
        }
    }

    /// A chord taken at face value from its template, as when only a symbol is known.
    pub fn from_template(root: PitchClass, root_name: &str, quality: &ChordQuality) -> Self {
        let observed: Vec<u8> = quality
            .intervals
            .iter()
            .map(|i| root.transpose(*i).value())
            .collect();
        Self::from_observation(root, root_name, quality, &observed, None)
    }

    /// The root as a [`PitchClass`].
    pub fn root(&self) -> PitchClass {
        PitchClass::new(self.root_pitch_class)
    }

    /// Template tones ordered from the root upward (root, third, fifth, ...).
    pub fn chord_tones(&self) -> Vec<PitchClass> {
        let root = self.root();
        let mut tones: Vec<PitchClass> = self
            .template_pitch_classes
            .iter()
            .map(|pc| PitchClass::new(*pc))
            .collect();
        tones.sort_by_key(|pc| pc.interval_from(root));
        tones
    }
}

impl fmt::Display for DetectedChord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.symbol)
    }
}
