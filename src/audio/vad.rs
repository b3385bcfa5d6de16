//! Silence detection over a trailing window of audio.
//!
//! Classifies frames by short-term RMS energy against a configurable
//! threshold. The session engine uses the result for two decisions: skipping
//! recognition passes over pure silence, and treating a long-enough trailing
//! silence as an utterance boundary.

use crate::defaults;
use std::time::Duration;

/// Configuration for silence detection.
#[derive(Debug, Clone, Copy)]
pub struct SilenceDetectorConfig {
    /// RMS threshold below which a frame counts as silence (0.0 to 1.0).
    pub silence_threshold: f32,
    /// Minimum trailing-silence duration (ms) that marks an utterance boundary.
    pub min_silence_ms: u32,
    /// Analysis frame length in milliseconds.
    pub frame_ms: u32,
}

impl Default for SilenceDetectorConfig {
    fn default() -> Self {
        Self {
            silence_threshold: defaults::SILENCE_THRESHOLD,
            min_silence_ms: defaults::MIN_SILENCE_MS,
            frame_ms: defaults::VAD_FRAME_MS,
        }
    }
}

/// Classification of a trailing window of audio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceReport {
    /// True when every analysis frame in the window was below the threshold.
    pub is_silence: bool,
    /// Duration of consecutive silence at the end of the window.
    pub trailing_silence: Duration,
}

/// Stateless frame-energy silence detector.
#[derive(Debug, Clone)]
pub struct SilenceDetector {
    config: SilenceDetectorConfig,
}

impl SilenceDetector {
    /// Creates a detector with the given configuration.
    pub fn new(config: SilenceDetectorConfig) -> Self {
        Self { config }
    }

    /// Returns the configured minimum silence duration for boundary detection.
    pub fn min_silence(&self) -> Duration {
        Duration::from_millis(self.config.min_silence_ms as u64)
    }

    /// Analyzes a window of samples, scanning frames from the tail.
    ///
    /// # Arguments
    /// * `samples` - Audio samples as 16-bit PCM
    /// * `sample_rate` - Sample rate in Hz (for duration calculations)
    pub fn analyze(&self, samples: &[i16], sample_rate: u32) -> SilenceReport {
        if samples.is_empty() {
            return SilenceReport {
                is_silence: true,
                trailing_silence: Duration::ZERO,
            };
        }

        let frame_len = (self.config.frame_ms as usize * sample_rate as usize / 1000).max(1);

        let mut trailing_samples = 0usize;
        let mut tail_silent = true;
        let mut all_silent = true;

        // rchunks yields the (possibly short) leading frame last, so the
        // trailing count stays sample-accurate.
        for frame in samples.rchunks(frame_len) {
            let silent = calculate_rms(frame) < self.config.silence_threshold;
            if !silent {
                all_silent = false;
                tail_silent = false;
            } else if tail_silent {
                trailing_samples += frame.len();
            }
        }

        SilenceReport {
            is_silence: all_silent,
            trailing_silence: Duration::from_millis(
                trailing_samples as u64 * 1000 / sample_rate as u64,
            ),
        }
    }
}

impl Default for SilenceDetector {
    fn default() -> Self {
        Self::new(SilenceDetectorConfig::default())
    }
}

/// Calculates the Root Mean Square (RMS) of audio samples.
///
/// # Returns
/// Normalized RMS value (0.0 to 1.0), where:
/// - 0.0 represents silence
/// - ~0.707 represents a full-scale sine wave
/// - 1.0 represents maximum amplitude
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    let mean_square = sum_squares / samples.len() as f64;
    mean_square.sqrt() as f32
}
