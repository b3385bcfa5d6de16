//! Accumulation buffer for one session's raw PCM samples.
//!
//! Decouples "what has arrived" from "what has been transcribed": partial
//! recognition passes re-read overlapping audio via non-destructive snapshots,
//! while final passes retire their audio explicitly via `commit`.

use crate::defaults;
use crate::error::{Result, ScribedError};
use std::collections::VecDeque;
use std::time::Duration;

/// A chunk of raw 16-bit signed PCM samples covering a contiguous interval.
#[derive(Debug, Clone)]
pub struct AudioChunk {
    /// Audio samples as 16-bit PCM.
    pub samples: Vec<i16>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of channels.
    pub channels: u16,
}

impl AudioChunk {
    /// Creates a chunk from already-decoded samples.
    pub fn new(samples: Vec<i16>, sample_rate: u32, channels: u16) -> Self {
        Self {
            samples,
            sample_rate,
            channels,
        }
    }

    /// Decodes a chunk from raw little-endian PCM bytes.
    ///
    /// Rejects byte sequences that are not sample-aligned rather than
    /// reinterpreting them.
    pub fn from_pcm_bytes(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<Self> {
        if bytes.len() % 2 != 0 {
            return Err(ScribedError::MalformedChunk {
                message: format!("byte length {} is not 16-bit aligned", bytes.len()),
            });
        }

        let samples = bytes
            .chunks_exact(2)
            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
            .collect();

        Ok(Self::new(samples, sample_rate, channels))
    }

    /// Returns the duration of this chunk.
    pub fn duration(&self) -> Duration {
        samples_to_duration(self.samples.len(), self.sample_rate)
    }
}

/// Configuration for the accumulation buffer.
#[derive(Debug, Clone)]
pub struct RingBufferConfig {
    /// Sample rate of the session's declared format in Hz.
    pub sample_rate: u32,
    /// Channel count of the session's declared format.
    pub channels: u16,
    /// Capacity in seconds of audio; exceeding it drops the oldest samples.
    pub capacity_secs: u32,
}

impl Default for RingBufferConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            channels: defaults::CHANNELS,
            capacity_secs: defaults::BUFFER_CAPACITY_SECS,
        }
    }
}

/// Result of an append: how much old audio had to be evicted, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Number of oldest unconsumed samples dropped to stay within capacity.
    pub dropped_samples: usize,
}

impl AppendOutcome {
    /// Returns true if the append evicted unconsumed audio.
    pub fn overflowed(&self) -> bool {
        self.dropped_samples > 0
    }
}

/// Read-only snapshot of buffered audio taken at trigger time.
///
/// This is the unit passed to the recognizer; it never changes after it is
/// taken, even if the underlying buffer keeps accumulating.
#[derive(Debug, Clone)]
pub struct RecognitionWindow {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl RecognitionWindow {
    /// Returns the snapshot's samples.
    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    /// Returns the duration covered by this window.
    pub fn duration(&self) -> Duration {
        samples_to_duration(self.samples.len(), self.sample_rate)
    }

    /// Returns true if the window contains no audio.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Fixed-policy accumulation buffer for one session.
#[derive(Debug)]
pub struct AudioRingBuffer {
    config: RingBufferConfig,
    samples: VecDeque<i16>,
    capacity_samples: usize,
}

impl AudioRingBuffer {
    /// Creates an empty buffer with the given configuration.
    pub fn new(config: RingBufferConfig) -> Self {
        let capacity_samples = config.sample_rate as usize * config.capacity_secs as usize;
        Self {
            config,
            samples: VecDeque::new(),
            capacity_samples,
        }
    }

    /// Returns the sample rate of the session's declared format.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate
    }

    /// Appends a chunk in arrival order.
    ///
    /// Fails if the chunk's encoding parameters mismatch the session's
    /// declared format. When the capacity is exceeded, the oldest unconsumed
    /// samples are evicted (drop-oldest) and reported in the outcome so the
    /// caller can warn about the underrun instead of losing data silently.
    pub fn append(&mut self, chunk: &AudioChunk) -> Result<AppendOutcome> {
        if chunk.sample_rate != self.config.sample_rate || chunk.channels != self.config.channels {
            return Err(ScribedError::FormatMismatch {
                expected: format_label(self.config.sample_rate, self.config.channels),
                actual: format_label(chunk.sample_rate, chunk.channels),
            });
        }

        self.samples.extend(chunk.samples.iter().copied());

        let mut dropped = 0;
        while self.samples.len() > self.capacity_samples {
            self.samples.pop_front();
            dropped += 1;
        }

        Ok(AppendOutcome {
            dropped_samples: dropped,
        })
    }

    /// Returns the most recent up-to-`max` of unconsumed audio without
    /// removing it. A subsequent append continues from the same tail.
    pub fn snapshot_window(&self, max: Duration) -> RecognitionWindow {
        let max_samples = duration_to_samples(max, self.config.sample_rate);
        let start = self.samples.len().saturating_sub(max_samples);
        RecognitionWindow {
            samples: self.samples.range(start..).copied().collect(),
            sample_rate: self.config.sample_rate,
        }
    }

    /// Retires the oldest `upto` of buffered audio after it has been
    /// finalized; it will never be re-read.
    pub fn commit(&mut self, upto: Duration) {
        let n = duration_to_samples(upto, self.config.sample_rate).min(self.samples.len());
        self.samples.drain(..n);
    }

    /// Retires all unconsumed audio.
    pub fn commit_all(&mut self) {
        self.samples.clear();
    }

    /// Returns the duration of unconsumed audio.
    pub fn unconsumed(&self) -> Duration {
        samples_to_duration(self.samples.len(), self.config.sample_rate)
    }

    /// Returns the number of unconsumed samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if no unconsumed audio remains.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Converts a duration to a sample count at the given rate.
pub fn duration_to_samples(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_millis() as u64 * sample_rate as u64 / 1000) as usize
}

/// Converts a sample count to the duration it covers at the given rate.
pub fn samples_to_duration(samples: usize, sample_rate: u32) -> Duration {
    Duration::from_millis(samples as u64 * 1000 / sample_rate as u64)
}

fn format_label(sample_rate: u32, channels: u16) -> String {
    let layout = if channels == 1 { "mono" } else { "multichannel" };
    format!("{} Hz {}", sample_rate, layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_of(samples: Vec<i16>) -> AudioChunk {
        AudioChunk::new(samples, 16000, 1)
    }

    fn small_buffer(capacity_secs: u32) -> AudioRingBuffer {
        AudioRingBuffer::new(RingBufferConfig {
            sample_rate: 16000,
            channels: 1,
            capacity_secs,
        })
    }

    #[test]
    fn test_chunk_from_pcm_bytes() {
        let bytes = [0x01, 0x00, 0xFF, 0xFF]; // [1, -1]
        let chunk = AudioChunk::from_pcm_bytes(&bytes, 16000, 1).unwrap();
        assert_eq!(chunk.samples, vec![1i16, -1]);
    }

    #[test]
    fn test_chunk_rejects_unaligned_bytes() {
        let result = AudioChunk::from_pcm_bytes(&[0x01, 0x00, 0xFF], 16000, 1);
        assert!(matches!(result, Err(ScribedError::MalformedChunk { .. })));
    }

    #[test]
    fn test_chunk_duration() {
        let chunk = chunk_of(vec![0i16; 16000]);
        assert_eq!(chunk.duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_append_accumulates_in_order() {
        let mut buffer = small_buffer(10);
        buffer.append(&chunk_of(vec![1, 2])).unwrap();
        buffer.append(&chunk_of(vec![3])).unwrap();

        let window = buffer.snapshot_window(Duration::from_secs(10));
        assert_eq!(window.samples(), &[1, 2, 3]);
    }

    #[test]
    fn test_append_rejects_format_mismatch() {
        let mut buffer = small_buffer(10);
        let wrong_rate = AudioChunk::new(vec![0; 100], 44100, 1);
        let result = buffer.append(&wrong_rate);
        assert!(matches!(result, Err(ScribedError::FormatMismatch { .. })));
        assert!(buffer.is_empty(), "rejected chunk must not be buffered");

        let wrong_channels = AudioChunk::new(vec![0; 100], 16000, 2);
        assert!(buffer.append(&wrong_channels).is_err());
    }

    #[test]
    fn test_snapshot_is_non_destructive() {
        let mut buffer = small_buffer(10);
        buffer.append(&chunk_of(vec![5i16; 1600])).unwrap();

        let before = buffer.len();
        let _window = buffer.snapshot_window(Duration::from_secs(10));
        assert_eq!(buffer.len(), before);
    }

    #[test]
    fn test_snapshot_prefers_most_recent_audio() {
        let mut buffer = small_buffer(10);
        // 1 second of 1s followed by 1 second of 2s
        buffer.append(&chunk_of(vec![1i16; 16000])).unwrap();
        buffer.append(&chunk_of(vec![2i16; 16000])).unwrap();

        let window = buffer.snapshot_window(Duration::from_millis(500));
        assert_eq!(window.samples().len(), 8000);
        assert!(window.samples().iter().all(|&s| s == 2));
    }

    #[test]
    fn test_commit_retires_oldest_prefix() {
        let mut buffer = small_buffer(10);
        buffer.append(&chunk_of(vec![1i16; 16000])).unwrap();
        buffer.append(&chunk_of(vec![2i16; 16000])).unwrap();

        buffer.commit(Duration::from_secs(1));
        assert_eq!(buffer.len(), 16000);

        let window = buffer.snapshot_window(Duration::from_secs(10));
        assert!(window.samples().iter().all(|&s| s == 2));
    }

    #[test]
    fn test_commit_all_empties_buffer() {
        let mut buffer = small_buffer(10);
        buffer.append(&chunk_of(vec![1i16; 1000])).unwrap();
        buffer.commit_all();
        assert!(buffer.is_empty());
        assert_eq!(buffer.unconsumed(), Duration::ZERO);
    }

    #[test]
    fn test_overflow_drops_oldest_and_reports() {
        let mut buffer = small_buffer(1); // capacity: 16000 samples
        let outcome = buffer.append(&chunk_of(vec![1i16; 16000])).unwrap();
        assert!(!outcome.overflowed());

        let outcome = buffer.append(&chunk_of(vec![2i16; 8000])).unwrap();
        assert!(outcome.overflowed());
        assert_eq!(outcome.dropped_samples, 8000);
        assert_eq!(buffer.len(), 16000, "length stays capped at capacity");

        // The oldest audio was the part evicted
        let window = buffer.snapshot_window(Duration::from_secs(2));
        assert_eq!(window.samples()[0..8000], vec![1i16; 8000][..]);
        assert_eq!(window.samples()[8000..], vec![2i16; 8000][..]);
    }

    #[test]
    fn test_duration_sample_conversions() {
        assert_eq!(duration_to_samples(Duration::from_secs(1), 16000), 16000);
        assert_eq!(duration_to_samples(Duration::from_millis(300), 16000), 4800);
        assert_eq!(samples_to_duration(16000, 16000), Duration::from_secs(1));
        assert_eq!(samples_to_duration(4800, 16000), Duration::from_millis(300));
    }

    #[test]
    fn test_empty_snapshot() {
        let buffer = small_buffer(10);
        let window = buffer.snapshot_window(Duration::from_secs(1));
        assert!(window.is_empty());
        assert_eq!(window.duration(), Duration::ZERO);
    }
}
