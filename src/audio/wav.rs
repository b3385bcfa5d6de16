//! WAV container decoding.
//!
//! Pure function from WAV bytes to session-format PCM. Sessions accept either
//! raw PCM frames or WAV-containered audio; this module handles the latter,
//! downmixing to mono and resampling to the session rate.

use crate::error::{Result, ScribedError};
use hound::SampleFormat;
use std::io::Cursor;

/// Returns true if the bytes begin with a RIFF/WAVE header.
pub fn looks_like_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Decodes WAV bytes to 16-bit PCM at the target rate, mono.
///
/// Supports arbitrary source rates and channel counts; stereo is downmixed by
/// averaging, other rates are linearly resampled.
pub fn decode_wav(bytes: &[u8], target_rate: u32) -> Result<Vec<i16>> {
    let mut reader =
        hound::WavReader::new(Cursor::new(bytes)).map_err(|e| ScribedError::MalformedChunk {
            message: format!("failed to parse WAV data: {}", e),
        })?;

    let spec = reader.spec();
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        return Err(ScribedError::FormatMismatch {
            expected: "16-bit integer PCM".to_string(),
            actual: format!("{}-bit {:?}", spec.bits_per_sample, spec.sample_format),
        });
    }

    let raw_samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ScribedError::MalformedChunk {
            message: format!("failed to read WAV samples: {}", e),
        })?;

    // Downmix to mono if needed
    let mono_samples = if spec.channels > 1 {
        let channels = spec.channels as usize;
        raw_samples
            .chunks_exact(channels)
            .map(|frame| {
                let sum: i32 = frame.iter().map(|&s| s as i32).sum();
                (sum / channels as i32) as i16
            })
            .collect()
    } else {
        raw_samples
    };

    if spec.sample_rate != target_rate {
        Ok(resample(&mono_samples, spec.sample_rate, target_rate))
    } else {
        Ok(mono_samples)
    }
}

/// Simple linear interpolation resampling.
fn resample(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / ratio).ceil() as usize;

    (0..output_len)
        .map(|i| {
            let source_pos = i as f64 * ratio;
            let source_idx = source_pos.floor() as usize;
            let fraction = source_pos - source_idx as f64;

            if source_idx + 1 >= samples.len() {
                samples[samples.len() - 1]
            } else {
                let left = samples[source_idx] as f64;
                let right = samples[source_idx + 1] as f64;
                (left + (right - left) * fraction) as i16
            }
        })
        .collect()
}
