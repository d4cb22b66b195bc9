use crate::emotion::{ClassifyError, EmotionProbabilities, FaceClassifier, TextClassifier};
use crate::inference::{InferenceClient, Payload};
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use std::path::PathBuf;

/// Enough to return every label of the emotion heads we target.
const TOP_K: u32 = 16;

#[derive(Deserialize)]
struct LabelScore {
    label: String,
    score: f32,
}

// Text endpoints nest one list per input; image endpoints return a flat list.
#[derive(Deserialize)]
#[serde(untagged)]
enum ClassificationResponse {
    Nested(Vec<Vec<LabelScore>>),
    Flat(Vec<LabelScore>),
}

fn parse_scores(body: &[u8]) -> Result<EmotionProbabilities, ClassifyError> {
    let response: ClassificationResponse = serde_json::from_slice(body)
        .map_err(|e| ClassifyError::InvalidResponse(format!("failed to parse JSON: {e}")))?;

    let scores = match response {
        ClassificationResponse::Nested(outer) => outer.into_iter().next().unwrap_or_default(),
        ClassificationResponse::Flat(scores) => scores,
    };

    Ok(scores.into_iter().map(|s| (s.label, s.score)).collect())
}

/// Text emotion classifier backed by a hosted sequence-classification model.
#[derive(Clone, Debug)]
pub struct HfTextClassifier {
    client: InferenceClient,
    model: String,
}

impl HfTextClassifier {
    pub fn new<S: Into<String>>(client: InferenceClient, model: S) -> Result<Self, ClassifyError> {
        let model = model.into();
        client
            .model_url(&model)
            .map_err(|e| ClassifyError::Unavailable(e.to_string()))?;
        Ok(Self { client, model })
    }
}

impl TextClassifier for HfTextClassifier {
    fn classify_text(
        &self,
        text: String,
    ) -> BoxFuture<'_, Result<EmotionProbabilities, ClassifyError>> {
        async move {
            if text.trim().is_empty() {
                return Ok(EmotionProbabilities::new());
            }

            let payload = Payload::Json(serde_json::json!({
                "inputs": text,
                "parameters": { "top_k": TOP_K },
            }));
            let body = self.client.post(&self.model, payload, None).await?;
            let probs = parse_scores(&body)?;
            tracing::debug!(model = %self.model, labels = probs.len(), "text classified");
            Ok(probs)
        }
        .boxed()
    }
}

/// Facial expression classifier backed by a hosted image-classification model.
#[derive(Clone, Debug)]
pub struct HfFaceClassifier {
    client: InferenceClient,
    model: String,
}

impl HfFaceClassifier {
    pub fn new<S: Into<String>>(client: InferenceClient, model: S) -> Result<Self, ClassifyError> {
        let model = model.into();
        client
            .model_url(&model)
            .map_err(|e| ClassifyError::Unavailable(e.to_string()))?;
        Ok(Self { client, model })
    }
}

impl FaceClassifier for HfFaceClassifier {
    fn classify_face(
        &self,
        image_path: PathBuf,
    ) -> BoxFuture<'_, Result<EmotionProbabilities, ClassifyError>> {
        async move {
            if image_path.as_os_str().is_empty() {
                return Ok(EmotionProbabilities::new());
            }

            let image = tokio::fs::read(&image_path)
                .await
                .map_err(|source| ClassifyError::Io {
                    path: image_path.clone(),
                    source,
                })?;
            if image.is_empty() {
                return Err(ClassifyError::EmptyInput("portrait image file is empty"));
            }

            let body = self
                .client
                .post(&self.model, Payload::Binary(Bytes::from(image)), None)
                .await?;
            let probs = parse_scores(&body)?;
            tracing::debug!(
                model = %self.model,
                image = %image_path.display(),
                labels = probs.len(),
                "face classified"
            );
            Ok(probs)
        }
        .boxed()
    }
}
