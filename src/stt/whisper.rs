//! Whisper-based speech recognition backend.
//!
//! Implements the [`Transcriber`] trait over whisper-rs. One context is
//! loaded per process and shared across sessions; each call creates its own
//! inference state, so concurrent sessions can transcribe in parallel up to
//! the engine's concurrency cap.
//!
//! # Feature Gate
//!
//! Requires the `whisper` feature (enabled by default) and cmake to build:
//!
//! ```bash
//! cargo build --release
//! ```

use crate::defaults;
use crate::error::{Result, ScribedError};
use crate::stt::transcriber::Transcriber;
use std::path::PathBuf;
use std::sync::Once;
use whisper_rs::{
    FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters, install_logging_hooks,
};

static LOGGING_HOOKS_INSTALLED: Once = Once::new();

/// Configuration for the Whisper recognizer.
#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Path to the Whisper model file
    pub model_path: PathBuf,
    /// Number of threads for inference (None = auto-detect)
    pub threads: Option<usize>,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(defaults::DEFAULT_MODEL_PATH),
            threads: None,
        }
    }
}

/// Whisper-backed recognizer shared across sessions.
pub struct WhisperTranscriber {
    context: WhisperContext,
    config: WhisperConfig,
    model_name: String,
}

impl std::fmt::Debug for WhisperTranscriber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhisperTranscriber")
            .field("config", &self.config)
            .field("model_name", &self.model_name)
            .field("context", &"<WhisperContext>")
            .finish()
    }
}

impl WhisperTranscriber {
    /// Loads the model at `config.model_path`.
    ///
    /// # Errors
    /// Returns `ScribedError::ModelNotFound` if the model file doesn't exist
    /// and `ScribedError::Recognizer` if model loading fails.
    pub fn new(config: WhisperConfig) -> Result<Self> {
        // Install logging hooks to suppress whisper.cpp output (only once)
        LOGGING_HOOKS_INSTALLED.call_once(|| {
            install_logging_hooks();
        });

        if !config.model_path.exists() {
            return Err(ScribedError::ModelNotFound {
                path: config.model_path.to_string_lossy().to_string(),
            });
        }

        let model_name = config
            .model_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();

        let path = config
            .model_path
            .to_str()
            .ok_or_else(|| ScribedError::Recognizer {
                message: "Invalid UTF-8 in model path".to_string(),
            })?;

        let context = WhisperContext::new_with_params(path, WhisperContextParameters::default())
            .map_err(|e| ScribedError::Recognizer {
                message: format!("Failed to load Whisper model: {}", e),
            })?;

        Ok(Self {
            context,
            config,
            model_name,
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &WhisperConfig {
        &self.config
    }

    /// Convert i16 audio samples to f32 normalized to [-1.0, 1.0]
    ///
    /// Whisper expects audio in f32 format normalized to the range [-1.0, 1.0].
    fn convert_audio(samples: &[i16]) -> Vec<f32> {
        samples
            .iter()
            .map(|&sample| sample as f32 / 32768.0)
            .collect()
    }
}

impl Transcriber for WhisperTranscriber {
    fn transcribe(&self, audio: &[i16], language: &str) -> Result<String> {
        let audio_f32 = Self::convert_audio(audio);

        // Each call gets its own state; the context itself is immutable after
        // load, so sessions can run passes concurrently.
        let mut state = self
            .context
            .create_state()
            .map_err(|e| ScribedError::Recognizer {
                message: format!("Failed to create Whisper state: {}", e),
            })?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });

        if language == defaults::AUTO_LANGUAGE {
            params.set_language(None);
        } else {
            params.set_language(Some(language));
        }

        if let Some(threads) = self.config.threads {
            params.set_n_threads(threads as i32);
        }

        // Disable printing to stdout/stderr
        params.set_print_special(false);
        params.set_print_progress(false);
        params.set_print_realtime(false);
        params.set_print_timestamps(false);

        state
            .full(params, &audio_f32)
            .map_err(|e| ScribedError::Recognizer {
                message: format!("Whisper inference failed: {}", e),
            })?;

        let mut transcription = String::new();
        for segment in state.as_iter() {
            transcription.push_str(&segment.to_string());
        }

        Ok(transcription.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        // The transcriber is ready if we successfully created it
        true
    }
}
