//! Projection of classifier output onto the valence/arousal plane.
//!
//! Each source has its own linear weight table. The projection is
//! `sum(p[label] * weight[label])` per axis, clamped to [-1, 1].
//!
//! Label policy: labels missing from the probabilities contribute 0, and
//! labels the table does not know are ignored (logged at debug). Sums other
//! than 1 are accepted as-is; the clamp keeps the result in range.

use crate::emotion::{EmotionProbabilities, EmotionSource, ValenceArousal};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("invalid input: probability for '{label}' is {value}, expected a finite value in [0, 1]")]
    InvalidInput { label: String, value: f32 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmotionWeight {
    pub label: &'static str,
    pub valence: f32,
    pub arousal: f32,
}

const fn w(label: &'static str, valence: f32, arousal: f32) -> EmotionWeight {
    EmotionWeight {
        label,
        valence,
        arousal,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightTable {
    pub source: EmotionSource,
    pub weights: &'static [EmotionWeight],
}

impl WeightTable {
    pub fn get(&self, label: &str) -> Option<&EmotionWeight> {
        self.weights.iter().find(|w| w.label == label)
    }
}

pub const TEXT_WEIGHTS: WeightTable = WeightTable {
    source: EmotionSource::Text,
    weights: &[
        w("angry", -0.6, 0.7),
        w("fear", -0.7, 0.6),
        w("happy", 0.8, 0.4),
        w("sad", -0.8, -0.3),
        w("surprise", 0.2, 0.7),
        w("neutral", 0.0, 0.0),
    ],
};

pub const FACE_WEIGHTS: WeightTable = WeightTable {
    source: EmotionSource::Face,
    weights: &[
        w("angry", -0.7, 0.6),
        w("disgust", -0.7, 0.3),
        w("fear", -0.7, 0.7),
        w("happy", 0.8, 0.5),
        w("sad", -0.8, -0.4),
        w("surprise", 0.1, 0.8),
        w("neutral", 0.0, 0.0),
    ],
};

pub fn map_to_va(
    probabilities: &EmotionProbabilities,
    table: &WeightTable,
) -> Result<ValenceArousal, MappingError> {
    for (label, value) in probabilities.iter() {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(MappingError::InvalidInput {
                label: label.to_owned(),
                value,
            });
        }
    }

    let unknown: Vec<&str> = probabilities
        .iter()
        .map(|(label, _)| label)
        .filter(|label| table.get(label).is_none())
        .collect();
    if !unknown.is_empty() {
        tracing::debug!(source = %table.source, ?unknown, "ignoring labels without weights");
    }

    let (valence, arousal) = table.weights.iter().fold((0.0f32, 0.0f32), |(v, a), w| {
        let p = probabilities.get(w.label);
        (v + p * w.valence, a + p * w.arousal)
    });

    Ok(ValenceArousal::new(valence, arousal))
}

pub fn map_text(probabilities: &EmotionProbabilities) -> Result<ValenceArousal, MappingError> {
    map_to_va(probabilities, &TEXT_WEIGHTS)
}

pub fn map_face(probabilities: &EmotionProbabilities) -> Result<ValenceArousal, MappingError> {
    map_to_va(probabilities, &FACE_WEIGHTS)
}
