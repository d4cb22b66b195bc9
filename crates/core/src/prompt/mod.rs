//! Turning a valence/arousal point into a text-to-music prompt.
//!
//! Valence picks the mood word and arousal picks the motion phrase, each from
//! a bucketed table with a random pick inside the bucket. The genre is a
//! fixed quadrant rule. Randomness comes from the caller's `Rng` so a seeded
//! generator reproduces a prompt exactly.

use crate::emotion::ValenceArousal;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A half-open bucket `[start, end)` of one axis and its candidate phrases.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DescriptorRange {
    pub start: f32,
    pub end: f32,
    pub descriptors: &'static [&'static str],
}

impl DescriptorRange {
    pub fn contains(&self, value: f32) -> bool {
        self.start <= value && value < self.end
    }
}

const fn range(start: f32, end: f32, descriptors: &'static [&'static str]) -> DescriptorRange {
    DescriptorRange {
        start,
        end,
        descriptors,
    }
}

pub const VALENCE_RANGES: [DescriptorRange; 5] = [
    range(0.6, 1.0, &["Joyful", "Elated", "Bright"]),
    range(0.2, 0.6, &["Contented", "Warm", "Peaceful"]),
    range(-0.2, 0.2, &["Reflective", "Pensive", "Steady"]),
    range(-0.6, -0.2, &["Somber", "Melancholic", "Heavy"]),
    range(-1.0, -0.6, &["Dissonant", "Ominous", "Aggressive"]),
];

pub const AROUSAL_RANGES: [DescriptorRange; 5] = [
    range(
        0.6,
        1.0,
        &["Driving beat", "Frantic pace", "Energetic percussion"],
    ),
    range(0.2, 0.6, &["Steady rhythm", "Active pulse", "Flowing beat"]),
    range(
        -0.2,
        0.2,
        &[
            "Subtle instrumentation",
            "Calm and smooth tempo",
            "Minimalist pulse",
        ],
    ),
    range(
        -0.6,
        -0.2,
        &[
            "Sparse texture",
            "Slow evolving harmony",
            "Soft and muted rhythm",
        ],
    ),
    range(
        -1.0,
        -0.6,
        &["Almost motionless", "Very slow, drifting", "Distant and static"],
    ),
];

/// Bucket for `value`; anything no bucket claims (exactly 1.0, NaN, or out
/// of range) falls back to the last, most negative bucket.
pub fn find_range(ranges: &[DescriptorRange], value: f32) -> Option<&DescriptorRange> {
    ranges
        .iter()
        .find(|r| r.contains(value))
        .or_else(|| ranges.last())
}

pub fn select_descriptor<R: Rng + ?Sized>(
    ranges: &[DescriptorRange],
    value: f32,
    rng: &mut R,
) -> Option<&'static str> {
    let bucket = find_range(ranges, value)?;
    if bucket.descriptors.is_empty() {
        return None;
    }
    let idx = rng.random_range(0..bucket.descriptors.len());
    Some(bucket.descriptors[idx])
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Genre {
    UpbeatPopRock,
    WarmAcoustic,
    DarkElectronic,
    MelancholicPiano,
    NeutralLofi,
}

impl Genre {
    pub const ALL: [Genre; 5] = [
        Genre::UpbeatPopRock,
        Genre::WarmAcoustic,
        Genre::DarkElectronic,
        Genre::MelancholicPiano,
        Genre::NeutralLofi,
    ];

    /// Quadrant rule; the first matching arm wins.
    pub fn for_point(valence: f32, arousal: f32) -> Self {
        if valence >= 0.3 && arousal >= 0.3 {
            Genre::UpbeatPopRock
        } else if valence >= 0.3 {
            Genre::WarmAcoustic
        } else if valence < 0.0 && arousal >= 0.3 {
            Genre::DarkElectronic
        } else if valence < 0.0 {
            Genre::MelancholicPiano
        } else {
            Genre::NeutralLofi
        }
    }

    pub fn phrase(&self) -> &'static str {
        match self {
            Genre::UpbeatPopRock => "Upbeat pop/rock",
            Genre::WarmAcoustic => "Warm acoustic or ambient",
            Genre::DarkElectronic => "Dark electronic or cinematic",
            Genre::MelancholicPiano => "Slow, melancholic piano and strings",
            Genre::NeutralLofi => "Neutral lo-fi or ambient",
        }
    }

    /// Recover the genre a prompt was built with.
    pub fn from_prompt(prompt: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|g| prompt.starts_with(g.phrase()))
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.phrase())
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PromptError {
    #[error("descriptor table has no candidates for {axis}={value}")]
    NoDescriptor { axis: &'static str, value: String },
}

/// A generated music prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt {
    text: String,
    genre: Genre,
    mood: &'static str,
    motion: &'static str,
}

impl Prompt {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn genre(&self) -> Genre {
        self.genre
    }

    pub fn mood(&self) -> &'static str {
        self.mood
    }

    pub fn motion(&self) -> &'static str {
        self.motion
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

pub fn build_prompt<R: Rng + ?Sized>(
    valence: f32,
    arousal: f32,
    rng: &mut R,
) -> Result<Prompt, PromptError> {
    let mood = select_descriptor(&VALENCE_RANGES, valence, rng).ok_or_else(|| {
        PromptError::NoDescriptor {
            axis: "valence",
            value: valence.to_string(),
        }
    })?;
    let motion = select_descriptor(&AROUSAL_RANGES, arousal, rng).ok_or_else(|| {
        PromptError::NoDescriptor {
            axis: "arousal",
            value: arousal.to_string(),
        }
    })?;
    let genre = Genre::for_point(valence, arousal);

    let text = format!(
        "{genre} instrumental soundtrack, {mood} mood, {motion}, high quality, atmospheric, no vocals."
    );

    Ok(Prompt {
        text,
        genre,
        mood,
        motion,
    })
}

pub fn build_prompt_for<R: Rng + ?Sized>(
    point: ValenceArousal,
    rng: &mut R,
) -> Result<Prompt, PromptError> {
    build_prompt(point.valence(), point.arousal(), rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn quadrant_boundaries() {
        assert_eq!(Genre::for_point(0.3, 0.3), Genre::UpbeatPopRock);
        assert_eq!(Genre::for_point(0.3, 0.29), Genre::WarmAcoustic);
        assert_eq!(Genre::for_point(-0.1, 0.5), Genre::DarkElectronic);
        assert_eq!(Genre::for_point(-0.1, 0.1), Genre::MelancholicPiano);
        assert_eq!(Genre::for_point(0.1, 0.1), Genre::NeutralLofi);
        assert_eq!(Genre::for_point(0.0, 0.9), Genre::NeutralLofi);
    }

    #[test]
    fn boundary_prompts_name_expected_genre() {
        let p = build_prompt(0.3, 0.3, &mut rng()).unwrap();
        assert!(p.as_str().starts_with("Upbeat pop/rock instrumental soundtrack, "));
        let p = build_prompt(-0.1, 0.5, &mut rng()).unwrap();
        assert!(p.as_str().starts_with("Dark electronic or cinematic"));
        let p = build_prompt(0.1, 0.1, &mut rng()).unwrap();
        assert!(p.as_str().starts_with("Neutral lo-fi or ambient"));
    }

    #[test]
    fn prompt_layout() {
        let p = build_prompt(0.7, -0.7, &mut rng()).unwrap();
        assert!(VALENCE_RANGES[0].descriptors.contains(&p.mood()));
        assert!(AROUSAL_RANGES[4].descriptors.contains(&p.motion()));
        let expected = format!(
            "Warm acoustic or ambient instrumental soundtrack, {} mood, {}, high quality, atmospheric, no vocals.",
            p.mood(),
            p.motion()
        );
        assert_eq!(p.as_str(), expected);
    }

    #[test]
    fn every_prompt_ends_with_no_vocals_and_names_one_genre() {
        let mut r = rng();
        for vi in -10..=10 {
            for ai in -10..=10 {
                let p = build_prompt(vi as f32 / 10.0, ai as f32 / 10.0, &mut r).unwrap();
                assert!(p.as_str().ends_with("no vocals."));
                let named = Genre::ALL
                    .iter()
                    .filter(|g| p.as_str().contains(g.phrase()))
                    .count();
                assert_eq!(named, 1, "{}", p);
                assert_eq!(Genre::from_prompt(p.as_str()), Some(p.genre()));
            }
        }
    }

    #[test]
    fn same_seed_same_prompt() {
        let a = build_prompt(0.45, 0.1, &mut StdRng::seed_from_u64(42)).unwrap();
        let b = build_prompt(0.45, 0.1, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn buckets_are_half_open() {
        assert_eq!(find_range(&VALENCE_RANGES, 0.6).map(|r| r.start), Some(0.6));
        assert_eq!(find_range(&VALENCE_RANGES, 0.59).map(|r| r.start), Some(0.2));
        assert_eq!(find_range(&AROUSAL_RANGES, -0.2).map(|r| r.start), Some(-0.2));
        assert_eq!(find_range(&AROUSAL_RANGES, -1.0).map(|r| r.start), Some(-1.0));
    }

    #[test]
    fn upper_edge_falls_back_to_most_negative_bucket() {
        assert_eq!(find_range(&VALENCE_RANGES, 1.0).map(|r| r.start), Some(-1.0));
        assert_eq!(find_range(&AROUSAL_RANGES, 1.0).map(|r| r.start), Some(-1.0));

        let p = build_prompt(1.0, 1.0, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(p.genre(), Genre::UpbeatPopRock);
        assert!(VALENCE_RANGES[4].descriptors.contains(&p.mood()));
        assert!(AROUSAL_RANGES[4].descriptors.contains(&p.motion()));
    }

    #[test]
    fn oversummed_mapping_clamps_into_fallback_motion() {
        let probs = crate::emotion::EmotionProbabilities::new()
            .with("angry", 1.0)
            .with("fear", 1.0);
        let point = crate::emotion::map_text(&probs).unwrap();
        assert_eq!(point.arousal(), 1.0);

        let p = build_prompt_for(point, &mut rng()).unwrap();
        assert!(AROUSAL_RANGES[4].descriptors.contains(&p.motion()));
        assert_eq!(p.genre(), Genre::DarkElectronic);
    }

    #[test]
    fn unclaimed_values_fall_back_to_most_negative_bucket() {
        for v in [1.5f32, -1.5, f32::NAN] {
            assert_eq!(find_range(&VALENCE_RANGES, v).map(|r| r.start), Some(-1.0));
        }
        let mood = select_descriptor(&VALENCE_RANGES, 2.0, &mut rng()).unwrap();
        assert!(VALENCE_RANGES[4].descriptors.contains(&mood));
    }

    #[test]
    fn every_descriptor_is_reachable() {
        let mut r = rng();
        for bucket in VALENCE_RANGES.iter().chain(AROUSAL_RANGES.iter()) {
            let mid = (bucket.start + bucket.end) / 2.0;
            let mut seen = std::collections::BTreeSet::new();
            for _ in 0..200 {
                seen.insert(select_descriptor(std::slice::from_ref(bucket), mid, &mut r).unwrap());
            }
            assert_eq!(seen.len(), bucket.descriptors.len());
        }
    }

    #[test]
    fn tables_are_contiguous_over_unit_range() {
        for table in [&VALENCE_RANGES, &AROUSAL_RANGES] {
            assert_eq!(table[0].end, 1.0);
            assert_eq!(table[table.len() - 1].start, -1.0);
            for pair in table.windows(2) {
                assert_eq!(pair[0].start, pair[1].end);
            }
        }
    }
}
