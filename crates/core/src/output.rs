use crate::decode::f32_to_i16_pcm;
use crate::music::GeneratedAudio;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The audio file a run produced.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AudioArtifact {
    pub path: PathBuf,
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub duration: Duration,
}

#[derive(thiserror::Error, Debug)]
pub enum OutputError {
    #[error("refusing to write invalid audio: {0}")]
    InvalidAudio(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("wav encoding failed: {0}")]
    Wav(#[from] hound::Error),
}

/// Write `audio` as 16-bit PCM WAV at `path`, replacing any existing file.
pub fn write_wav(path: &Path, audio: &GeneratedAudio) -> Result<AudioArtifact, OutputError> {
    audio.validate().map_err(OutputError::InvalidAudio)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| OutputError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let spec = hound::WavSpec {
        channels: audio.channels,
        sample_rate: audio.sample_rate_hz,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for sample in f32_to_i16_pcm(&audio.samples) {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    let path = std::fs::canonicalize(path).map_err(|source| OutputError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(AudioArtifact {
        path,
        sample_rate_hz: audio.sample_rate_hz,
        channels: audio.channels,
        duration: audio.duration(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(channels: u16, frames: usize) -> GeneratedAudio {
        GeneratedAudio {
            sample_rate_hz: 8_000,
            channels,
            samples: (0..frames * usize::from(channels))
                .map(|i| ((i as f32) * 0.01).sin() * 0.5)
                .collect(),
        }
    }

    #[test]
    fn writes_readable_wav_and_reports_absolute_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("EmoMaestro.wav");
        let artifact = write_wav(&path, &tone(2, 8_000)).unwrap();

        assert!(artifact.path.is_absolute());
        assert_eq!(artifact.duration, Duration::from_secs(1));

        let reader = hound::WavReader::open(&artifact.path).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 8_000);
        assert_eq!(reader.len(), 16_000);
    }

    #[test]
    fn overwrites_previous_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        write_wav(&path, &tone(1, 16_000)).unwrap();
        write_wav(&path, &tone(1, 800)).unwrap();
        let reader = hound::WavReader::open(&path).unwrap();
        assert_eq!(reader.len(), 800);
    }

    #[test]
    fn invalid_audio_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.wav");
        let err = write_wav(&path, &tone(0, 10)).unwrap_err();
        assert!(matches!(err, OutputError::InvalidAudio(_)));
        assert!(!path.exists());
    }
}
