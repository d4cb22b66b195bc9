use crate::decode::decode_audio;
use crate::inference::{InferenceClient, Payload};
use crate::music::{GeneratedAudio, GenerationRequest, MusicError, MusicGenerator};
use futures::future::BoxFuture;
use futures::FutureExt;

/// Audio tokens per second of output; the model's length is token based, so
/// the requested duration is only approximate.
const TOKENS_PER_SECOND: u32 = 50;
const MIN_NEW_TOKENS: u32 = 64;

pub(crate) fn max_new_tokens(duration_secs: u32) -> u32 {
    TOKENS_PER_SECOND
        .saturating_mul(duration_secs)
        .max(MIN_NEW_TOKENS)
}

/// Text-to-audio generator backed by a hosted MusicGen-style model.
#[derive(Clone, Debug)]
pub struct HfMusicGenerator {
    client: InferenceClient,
    model: String,
}

impl HfMusicGenerator {
    pub fn new<S: Into<String>>(client: InferenceClient, model: S) -> Result<Self, MusicError> {
        let model = model.into();
        client
            .model_url(&model)
            .map_err(|e| MusicError::Unavailable(e.to_string()))?;
        Ok(Self { client, model })
    }
}

impl MusicGenerator for HfMusicGenerator {
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> BoxFuture<'_, Result<GeneratedAudio, MusicError>> {
        async move {
            if request.prompt.trim().is_empty() {
                return Err(MusicError::EmptyPrompt);
            }

            let tokens = max_new_tokens(request.duration.get());
            tracing::info!(
                model = %self.model,
                duration_secs = request.duration.get(),
                max_new_tokens = tokens,
                "requesting music generation"
            );

            let payload = Payload::Json(serde_json::json!({
                "inputs": request.prompt,
                "parameters": {
                    "do_sample": true,
                    "max_new_tokens": tokens,
                },
            }));
            let body = self
                .client
                .post(&self.model, payload, Some("audio/wav, audio/flac, audio/mpeg"))
                .await?;

            let audio = decode_audio(body)?;
            audio.validate().map_err(MusicError::InvalidAudio)?;
            Ok(audio)
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DurationSecs, InferenceConfig};

    #[test]
    fn token_budget_follows_duration() {
        assert_eq!(max_new_tokens(30), 1500);
        assert_eq!(max_new_tokens(1), 64);
        assert_eq!(max_new_tokens(u32::MAX), u32::MAX);
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_before_any_request() {
        let client = InferenceClient::new(&InferenceConfig::default()).unwrap();
        let generator = HfMusicGenerator::new(client, "facebook/musicgen-small").unwrap();
        let err = generator
            .generate(GenerationRequest {
                prompt: " ".into(),
                duration: DurationSecs::default(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, MusicError::EmptyPrompt));
    }
}
