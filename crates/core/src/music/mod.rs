mod remote;
mod tone;

use crate::config::DurationSecs;
use crate::decode::DecodeError;
use crate::inference::InferenceError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use remote::HfMusicGenerator;
pub use tone::ToneMusicGenerator;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub duration: DurationSecs,
}

/// Interleaved f32 PCM as returned by a generator.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GeneratedAudio {
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl GeneratedAudio {
    pub fn frames(&self) -> usize {
        if self.channels == 0 {
            return 0;
        }
        self.samples.len() / usize::from(self.channels)
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate_hz == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.frames() as f64 / f64::from(self.sample_rate_hz))
    }

    /// Reasons this buffer cannot be written or played, if any.
    pub fn validate(&self) -> Result<(), String> {
        if self.sample_rate_hz == 0 {
            return Err("sample rate is 0".to_owned());
        }
        if self.channels == 0 {
            return Err("channel count is 0".to_owned());
        }
        if self.samples.is_empty() {
            return Err("no samples".to_owned());
        }
        if self.samples.len() % usize::from(self.channels) != 0 {
            return Err(format!(
                "{} samples is not a multiple of {} channels",
                self.samples.len(),
                self.channels
            ));
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum MusicError {
    #[error("empty prompt")]
    EmptyPrompt,

    #[error("music generator unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("generated audio could not be decoded: {0}")]
    Decode(#[from] DecodeError),

    #[error("generator returned unusable audio: {0}")]
    InvalidAudio(String),
}

pub trait MusicGenerator: Send + Sync {
    fn generate(&self, request: GenerationRequest)
        -> BoxFuture<'_, Result<GeneratedAudio, MusicError>>;
}
