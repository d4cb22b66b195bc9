mod classifier;
mod fusion;
mod keyword;
mod mapper;
mod remote;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub use classifier::{ClassifyError, FaceClassifier, TextClassifier};
pub use fusion::{fuse, FusionError};
pub use keyword::KeywordTextClassifier;
pub use mapper::{
    map_face, map_text, map_to_va, EmotionWeight, MappingError, WeightTable, FACE_WEIGHTS,
    TEXT_WEIGHTS,
};
pub use remote::{HfFaceClassifier, HfTextClassifier};

/// Label synonyms emitted by common classifier vocabularies, folded onto the
/// canonical labels used by the weight tables.
const LABEL_ALIASES: &[(&str, &str)] = &[
    ("joy", "happy"),
    ("happiness", "happy"),
    ("anger", "angry"),
    ("sadness", "sad"),
    ("fearful", "fear"),
    ("surprised", "surprise"),
    ("disgusted", "disgust"),
];

pub fn normalize_label(label: &str) -> String {
    let lower = label.trim().to_lowercase();
    LABEL_ALIASES
        .iter()
        .find(|(alias, _)| *alias == lower)
        .map(|(_, canonical)| (*canonical).to_owned())
        .unwrap_or(lower)
}

/// Per-label probabilities reported by a classifier for one input.
///
/// Labels are normalized on insert; inserting a label twice (or two labels
/// that fold onto the same canonical label) sums their probabilities.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct EmotionProbabilities(BTreeMap<String, f32>);

impl EmotionProbabilities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, label: &str, probability: f32) {
        *self.0.entry(normalize_label(label)).or_insert(0.0) += probability;
    }

    pub fn with(mut self, label: &str, probability: f32) -> Self {
        self.insert(label, probability);
        self
    }

    /// Missing labels read as probability 0.
    pub fn get(&self, label: &str) -> f32 {
        self.0.get(label).copied().unwrap_or(0.0)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.0.contains_key(label)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn total(&self) -> f32 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Label with the highest probability, if any.
    pub fn dominant(&self) -> Option<(&str, f32)> {
        self.iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    }
}

impl<S: AsRef<str>> FromIterator<(S, f32)> for EmotionProbabilities {
    fn from_iter<I: IntoIterator<Item = (S, f32)>>(iter: I) -> Self {
        let mut out = Self::new();
        for (label, p) in iter {
            out.insert(label.as_ref(), p);
        }
        out
    }
}

/// Which modality a set of probabilities came from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum EmotionSource {
    Text,
    Face,
}

impl fmt::Display for EmotionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Face => f.write_str("face"),
        }
    }
}

/// A point in the valence/arousal plane. Both axes are clamped to [-1, 1]
/// on construction.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct ValenceArousal {
    valence: f32,
    arousal: f32,
}

impl ValenceArousal {
    pub const ORIGIN: Self = Self {
        valence: 0.0,
        arousal: 0.0,
    };

    pub fn new(valence: f32, arousal: f32) -> Self {
        Self {
            valence: valence.clamp(-1.0, 1.0),
            arousal: arousal.clamp(-1.0, 1.0),
        }
    }

    pub fn valence(&self) -> f32 {
        self.valence
    }

    pub fn arousal(&self) -> f32 {
        self.arousal
    }
}

impl Default for ValenceArousal {
    fn default() -> Self {
        Self::ORIGIN
    }
}

impl fmt::Display for ValenceArousal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(v={:.3}, a={:.3})", self.valence, self.arousal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_normalized_and_folded() {
        assert_eq!(normalize_label("  Happy "), "happy");
        assert_eq!(normalize_label("Joy"), "happy");
        assert_eq!(normalize_label("sadness"), "sad");
        assert_eq!(normalize_label("contempt"), "contempt");
    }

    #[test]
    fn aliases_sum_into_one_label() {
        let probs = EmotionProbabilities::new()
            .with("joy", 0.25)
            .with("Happy", 0.5);
        assert_eq!(probs.len(), 1);
        assert!((probs.get("happy") - 0.75).abs() < 1e-6);
    }

    #[test]
    fn missing_label_reads_as_zero() {
        let probs = EmotionProbabilities::new().with("sad", 1.0);
        assert_eq!(probs.get("angry"), 0.0);
        assert!(!probs.contains("angry"));
    }

    #[test]
    fn dominant_picks_highest_probability() {
        let probs: EmotionProbabilities =
            [("sad", 0.2), ("fear", 0.7), ("neutral", 0.1)].into_iter().collect();
        assert_eq!(probs.dominant().map(|(l, _)| l), Some("fear"));
        assert!(EmotionProbabilities::new().dominant().is_none());
    }

    #[test]
    fn point_is_clamped_on_construction() {
        let p = ValenceArousal::new(1.4, -3.0);
        assert_eq!(p.valence(), 1.0);
        assert_eq!(p.arousal(), -1.0);
    }
}
