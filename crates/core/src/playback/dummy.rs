use crate::music::GeneratedAudio;
use crate::playback::{PlaybackError, PlaybackSink};
use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Sink that discards audio and counts how many clips it was handed.
#[derive(Clone, Default)]
pub struct DummyPlaybackSink {
    played: Arc<AtomicUsize>,
}

impl DummyPlaybackSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> usize {
        self.played.load(Ordering::Relaxed)
    }
}

impl PlaybackSink for DummyPlaybackSink {
    fn play(&self, audio: GeneratedAudio) -> BoxFuture<'_, Result<(), PlaybackError>> {
        async move {
            audio.validate().map_err(PlaybackError::InvalidAudio)?;
            self.played.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }
        .boxed()
    }
}
