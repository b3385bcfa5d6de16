//! Speech-to-text backends behind the [`Transcriber`] seam.

pub mod transcriber;
#[cfg(feature = "whisper")]
pub mod whisper;

pub use transcriber::{MockTranscriber, Transcriber};
#[cfg(feature = "whisper")]
pub use whisper::{WhisperConfig, WhisperTranscriber};
