use crate::config::FusionWeight;
use crate::emotion::ValenceArousal;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FusionError {
    #[error("invalid input: at least one source required")]
    InvalidInput,
}

/// Combine the per-source points into one.
///
/// A lone source is returned unchanged. With both present the result is the
/// convex combination `text * w + face * (1 - w)`, clamped per axis.
pub fn fuse(
    text: Option<ValenceArousal>,
    face: Option<ValenceArousal>,
    weight: FusionWeight,
) -> Result<ValenceArousal, FusionError> {
    match (text, face) {
        (None, None) => Err(FusionError::InvalidInput),
        (Some(t), None) => Ok(t),
        (None, Some(f)) => Ok(f),
        (Some(t), Some(f)) => {
            let (wt, wf) = (weight.text(), weight.face());
            Ok(ValenceArousal::new(
                wt * t.valence() + wf * f.valence(),
                wt * t.arousal() + wf * f.arousal(),
            ))
        }
    }
}
