#[cfg(feature = "playback")]
mod audio;
mod dummy;

use crate::music::GeneratedAudio;
use futures::future::BoxFuture;

#[cfg(feature = "playback")]
pub use audio::AudioPlaybackSink;
pub use dummy::DummyPlaybackSink;

#[derive(thiserror::Error, Debug)]
pub enum PlaybackError {
    #[error("audio output unavailable: {details}")]
    AudioOutputUnavailable { details: String },

    #[error("invalid audio: {0}")]
    InvalidAudio(String),

    #[error("playback task failed: {0}")]
    Task(String),
}

pub trait PlaybackSink: Send + Sync {
    fn play(&self, audio: GeneratedAudio) -> BoxFuture<'_, Result<(), PlaybackError>>;
}
