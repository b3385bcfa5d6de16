//! scribed - streaming speech-to-text over a persistent WebSocket connection.
//!
//! Clients stream raw or WAV-containered audio incrementally; the server
//! returns intermediate ("partial") and finalized ("final") text as audio
//! accumulates, without the client knowing in advance how long the utterance
//! will be.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod server;
pub mod session;
pub mod stt;

// The engine's building blocks
pub use audio::buffer::{AudioChunk, AudioRingBuffer, RecognitionWindow, RingBufferConfig};
pub use audio::vad::{SilenceDetector, SilenceDetectorConfig, SilenceReport};
pub use session::registry::SessionRegistry;
pub use session::scheduler::{Decision, RecognitionScheduler, SchedulerConfig};
pub use session::session::{Session, SessionConfig, SessionState};

// The recognizer seam (real backend + test double)
pub use stt::transcriber::{MockTranscriber, Transcriber};
#[cfg(feature = "whisper")]
pub use stt::whisper::{WhisperConfig, WhisperTranscriber};

// Wire protocol and server
pub use server::protocol::{ClientCommand, ServerEvent, ServerMode};
pub use server::{AppState, router, serve};

// Error handling
pub use error::{Result, ScribedError};

// Config
pub use config::Config;

/// Build version string with optional git commit hash.
///
/// Returns `"0.3.0+abc1234"` when git hash is available, `"0.3.0"` otherwise.
pub fn version_string() -> String {
    let version = env!("CARGO_PKG_VERSION");
    match option_env!("GIT_HASH") {
        Some(hash) if !hash.is_empty() => format!("{}+{}", version, hash),
        _ => version.to_string(),
    }
}
