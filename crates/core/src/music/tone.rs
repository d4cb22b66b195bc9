use crate::config::MAX_DURATION_SECS;
use crate::music::{GeneratedAudio, GenerationRequest, MusicError, MusicGenerator};
use crate::prompt::Genre;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::f32::consts::PI;

const SAMPLE_RATE_HZ: u32 = 32_000;
const PEAK: f32 = 0.2;

/// Offline stand-in generator: a quiet root+fifth pad whose pitch and pulse
/// rate follow the genre named at the start of the prompt.
#[derive(Clone, Debug, Default)]
pub struct ToneMusicGenerator;

impl ToneMusicGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Root frequency (Hz) and amplitude pulse rate (Hz).
    fn voicing(genre: Option<Genre>) -> (f32, f32) {
        match genre {
            Some(Genre::UpbeatPopRock) => (329.63, 2.0),
            Some(Genre::WarmAcoustic) => (261.63, 1.0),
            Some(Genre::DarkElectronic) => (110.0, 2.5),
            Some(Genre::MelancholicPiano) => (220.0, 0.5),
            Some(Genre::NeutralLofi) | None => (196.0, 1.2),
        }
    }

    /// Lengths above `MAX_DURATION_SECS` are cut to it.
    pub fn render(&self, prompt: &str, duration_secs: u32) -> GeneratedAudio {
        let (root, pulse) = Self::voicing(Genre::from_prompt(prompt));
        let fifth = root * 1.5;
        let sr = SAMPLE_RATE_HZ as f32;
        let frames = SAMPLE_RATE_HZ as usize * duration_secs.min(MAX_DURATION_SECS) as usize;

        let samples = (0..frames)
            .map(|i| {
                let t = i as f32 / sr;
                let pad = (2.0 * PI * root * t).sin() + 0.5 * (2.0 * PI * fifth * t).sin();
                let envelope = 0.6 + 0.4 * (2.0 * PI * pulse * t).sin();
                PEAK * envelope * pad / 1.5
            })
            .collect();

        GeneratedAudio {
            sample_rate_hz: SAMPLE_RATE_HZ,
            channels: 1,
            samples,
        }
    }
}

impl MusicGenerator for ToneMusicGenerator {
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> BoxFuture<'_, Result<GeneratedAudio, MusicError>> {
        async move {
            if request.prompt.trim().is_empty() {
                return Err(MusicError::EmptyPrompt);
            }
            Ok(self.render(&request.prompt, request.duration.get()))
        }
        .boxed()
    }
}
