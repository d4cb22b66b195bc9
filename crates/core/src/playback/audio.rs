use crate::music::GeneratedAudio;
use crate::playback::{PlaybackError, PlaybackSink};
use futures::future::BoxFuture;
use futures::FutureExt;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStreamBuilder, Sink};

/// Plays a clip to completion on the default output device.
///
/// The `OutputStream` is opened on a blocking thread per clip and kept alive
/// until the sink drains; dropping it early cuts playback short.
#[derive(Clone, Debug, Default)]
pub struct AudioPlaybackSink;

impl AudioPlaybackSink {
    pub fn new() -> Self {
        Self
    }
}

fn play_blocking(audio: GeneratedAudio) -> Result<(), PlaybackError> {
    let stream = OutputStreamBuilder::open_default_stream().map_err(|e| {
        PlaybackError::AudioOutputUnavailable {
            details: format!("open default output stream: {e}"),
        }
    })?;
    let sink = Sink::connect_new(stream.mixer());
    sink.append(SamplesBuffer::new(
        audio.channels,
        audio.sample_rate_hz,
        audio.samples,
    ));
    sink.sleep_until_end();
    Ok(())
}

impl PlaybackSink for AudioPlaybackSink {
    fn play(&self, audio: GeneratedAudio) -> BoxFuture<'_, Result<(), PlaybackError>> {
        async move {
            audio.validate().map_err(PlaybackError::InvalidAudio)?;
            tracing::info!(
                sample_rate_hz = audio.sample_rate_hz,
                channels = audio.channels,
                duration_ms = audio.duration().as_millis() as u64,
                "playing generated audio"
            );
            tokio::task::spawn_blocking(move || play_blocking(audio))
                .await
                .map_err(|e| PlaybackError::Task(e.to_string()))?
        }
        .boxed()
    }
}
