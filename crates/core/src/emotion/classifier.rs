use crate::emotion::EmotionProbabilities;
use crate::inference::InferenceError;
use futures::future::BoxFuture;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("invalid classifier response: {0}")]
    InvalidResponse(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Emotion classifier for free text (a diary entry).
///
/// Blank text yields an empty mapping rather than an error.
pub trait TextClassifier: Send + Sync {
    fn classify_text(&self, text: String)
        -> BoxFuture<'_, Result<EmotionProbabilities, ClassifyError>>;
}

/// Facial expression classifier for a portrait image on disk.
pub trait FaceClassifier: Send + Sync {
    fn classify_face(
        &self,
        image_path: PathBuf,
    ) -> BoxFuture<'_, Result<EmotionProbabilities, ClassifyError>>;
}
