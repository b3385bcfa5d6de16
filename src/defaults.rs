//! Default configuration constants for scribed.
//!
//! Shared across configuration types to keep the engine, the server, and the
//! CLI in agreement about what "default" means.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Default number of audio channels. Sessions accept mono PCM only.
pub const CHANNELS: u16 = 1;

/// Default silence threshold for the silence detector.
///
/// This RMS-based threshold (0.0 to 1.0) determines when a frame of audio is
/// considered silence. A value of 0.02 is tuned for typical microphone input
/// levels and filters out background noise.
pub const SILENCE_THRESHOLD: f32 = 0.02;

/// Default minimum trailing-silence duration in milliseconds before the
/// scheduler treats the pause as an utterance boundary.
pub const MIN_SILENCE_MS: u32 = 300;

/// Frame length in milliseconds for the silence detector's short-term
/// energy analysis.
pub const VAD_FRAME_MS: u32 = 20;

/// Default amount of newly arrived audio, in milliseconds, that provokes a
/// partial recognition pass.
pub const TRIGGER_INTERVAL_MS: u32 = 3000;

/// Ceiling on the duration of a single recognition window in seconds.
///
/// Bounds worst-case recognizer latency and memory. When the unconsumed
/// buffer exceeds this, the most recent audio is preferred.
pub const MAX_WINDOW_SECS: u32 = 30;

/// Capacity of a session's accumulation buffer in seconds of audio.
///
/// Exceeding it drops the oldest unconsumed audio and surfaces an overflow
/// warning to the client.
pub const BUFFER_CAPACITY_SECS: u32 = 120;

/// Default cap on concurrent recognizer invocations across all sessions.
pub const MAX_CONCURRENT_PASSES: usize = 2;

/// Default language hint passed to the recognizer.
pub const DEFAULT_LANGUAGE: &str = "zh";

/// Language value that lets the recognizer detect the language itself.
pub const AUTO_LANGUAGE: &str = "auto";

/// Default path to the recognition model file.
pub const DEFAULT_MODEL_PATH: &str = "models/ggml-medium.bin";

/// Default server bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8765;
