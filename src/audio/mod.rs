//! Audio building blocks: the per-session accumulation buffer, silence
//! detection, and WAV container decoding.

pub mod buffer;
pub mod vad;
pub mod wav;

pub use buffer::{AppendOutcome, AudioChunk, AudioRingBuffer, RecognitionWindow, RingBufferConfig};
pub use vad::{SilenceDetector, SilenceDetectorConfig, SilenceReport};
