//! Decoding of generator responses (WAV, FLAC or MP3 containers) into
//! interleaved f32 PCM.

use crate::music::GeneratedAudio;
use bytes::Bytes;
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("no audio data")]
    Empty,

    #[error("unsupported or unrecognised audio container: {0}")]
    Unsupported(String),

    #[error("no decodable audio track")]
    NoTrack,

    #[error("decoder failed: {0}")]
    Decoder(String),

    #[error("audio stream did not report a sample rate")]
    MissingSampleRate,
}

pub type Result<T> = std::result::Result<T, DecodeError>;

pub fn decode_audio(data: Bytes) -> Result<GeneratedAudio> {
    if data.is_empty() {
        return Err(DecodeError::Empty);
    }

    let source = MediaSourceStream::new(Box::new(Cursor::new(data)), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or(DecodeError::NoTrack)?;
    let track_id = track.id;
    let mut sample_rate_hz = track.codec_params.sample_rate;
    let mut channels = track
        .codec_params
        .channels
        .map(|c| c.count() as u16);

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| DecodeError::Unsupported(e.to_string()))?;

    let mut samples: Vec<f32> = Vec::new();
    let mut skipped_packets = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(DecodeError::Decoder(e.to_string())),
        };
        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                sample_rate_hz = Some(spec.rate);
                channels = Some(spec.channels.count() as u16);

                let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
                buf.copy_interleaved_ref(decoded);
                samples.extend_from_slice(buf.samples());
            }
            Err(SymphoniaError::DecodeError(e)) => {
                skipped_packets += 1;
                tracing::debug!(error = %e, "skipping corrupt audio packet");
            }
            Err(e) => return Err(DecodeError::Decoder(e.to_string())),
        }
    }

    if skipped_packets > 0 {
        tracing::warn!(skipped_packets, "some audio packets could not be decoded");
    }

    let sample_rate_hz = sample_rate_hz.ok_or(DecodeError::MissingSampleRate)?;
    if samples.is_empty() {
        return Err(DecodeError::Empty);
    }

    Ok(GeneratedAudio {
        sample_rate_hz,
        channels: channels.unwrap_or(1),
        samples,
    })
}

pub fn f32_to_i16_pcm(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * f32::from(i16::MAX)).round() as i16)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wav_bytes(sample_rate: u32, channels: u16, samples: &[i16]) -> Bytes {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
            for &s in samples {
                writer.write_sample(s).unwrap();
            }
            writer.finalize().unwrap();
        }
        Bytes::from(cursor.into_inner())
    }

    #[test]
    fn decodes_stereo_wav() {
        let input: Vec<i16> = (0..800).map(|i| ((i % 40) * 500 - 10_000) as i16).collect();
        let audio = decode_audio(wav_bytes(16_000, 2, &input)).unwrap();
        assert_eq!(audio.sample_rate_hz, 16_000);
        assert_eq!(audio.channels, 2);
        assert_eq!(audio.samples.len(), input.len());
        let expected = f32::from(input[5]) / 32768.0;
        assert!((audio.samples[5] - expected).abs() < 1e-3);
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(matches!(decode_audio(Bytes::new()), Err(DecodeError::Empty)));
        assert!(decode_audio(Bytes::from_static(b"{\"error\":\"loading\"}")).is_err());
    }

    #[test]
    fn f32_to_i16_clamps() {
        let v = f32_to_i16_pcm(&[-2.0, -1.0, 0.0, 0.5, 1.0, 3.0]);
        assert_eq!(v[0], -i16::MAX);
        assert_eq!(v[2], 0);
        assert_eq!(v[3], 16384);
        assert_eq!(v[4], i16::MAX);
        assert_eq!(v[5], i16::MAX);
    }
}
