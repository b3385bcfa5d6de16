//! The recognizer seam of the session engine.
//!
//! The engine treats speech recognition as a black box behind the
//! [`Transcriber`] trait: a bounded PCM window plus a language hint in,
//! recognized text out. Real backends (Whisper) and test doubles plug in
//! behind the same contract.

use crate::error::{Result, ScribedError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Trait for speech-to-text recognition.
///
/// Implementations must be shareable across sessions; a loaded model is a
/// process-wide capability injected into the engine at construction.
pub trait Transcriber: Send + Sync {
    /// Transcribe a window of audio to text.
    ///
    /// # Arguments
    /// * `audio` - Audio samples as 16-bit PCM at 16kHz mono
    /// * `language` - Language hint (e.g. "zh", "en", or "auto")
    ///
    /// # Returns
    /// Transcribed text or error. A single-window call; the same window
    /// yields the same text.
    fn transcribe(&self, audio: &[i16], language: &str) -> Result<String>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across sessions.
impl<T: Transcriber + ?Sized> Transcriber for Arc<T> {
    fn transcribe(&self, audio: &[i16], language: &str) -> Result<String> {
        (**self).transcribe(audio, language)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock transcriber for testing
#[derive(Debug)]
pub struct MockTranscriber {
    model_name: String,
    response: String,
    should_fail: bool,
    calls: AtomicUsize,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: "mock transcription".to_string(),
            should_fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail on transcribe
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Number of transcribe calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, _audio: &[i16], _language: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            Err(ScribedError::Recognizer {
                message: "mock recognition failure".to_string(),
            })
        } else {
            Ok(self.response.clone())
        }
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_transcriber_returns_response() {
        let transcriber = MockTranscriber::new("test-model").with_response("Hello, this is a test");

        let audio = vec![0i16; 1000];
        let result = transcriber.transcribe(&audio, "en");

        assert!(result.is_ok());
        assert_eq!(result.unwrap(), "Hello, this is a test");
    }

    #[test]
    fn test_mock_transcriber_returns_error_when_configured() {
        let transcriber = MockTranscriber::new("test-model").with_failure();

        let audio = vec![0i16; 1000];
        let result = transcriber.transcribe(&audio, "en");

        match result {
            Err(ScribedError::Recognizer { message }) => {
                assert_eq!(message, "mock recognition failure");
            }
            _ => panic!("Expected Recognizer error"),
        }
    }

    #[test]
    fn test_mock_transcriber_counts_calls() {
        let transcriber = MockTranscriber::new("test-model");
        assert_eq!(transcriber.call_count(), 0);

        let audio = vec![0i16; 100];
        transcriber.transcribe(&audio, "en").unwrap();
        transcriber.transcribe(&audio, "en").unwrap();
        assert_eq!(transcriber.call_count(), 2);
    }

    #[test]
    fn test_mock_transcriber_is_ready() {
        assert!(MockTranscriber::new("test-model").is_ready());
        assert!(!MockTranscriber::new("test-model").with_failure().is_ready());
    }

    #[test]
    fn test_transcriber_trait_is_object_safe() {
        let transcriber: Arc<dyn Transcriber> =
            Arc::new(MockTranscriber::new("test-model").with_response("boxed test"));

        assert_eq!(transcriber.model_name(), "test-model");
        assert!(transcriber.is_ready());

        let audio = vec![0i16; 100];
        let result = transcriber.transcribe(&audio, "en");
        assert_eq!(result.unwrap(), "boxed test");
    }

    #[test]
    fn test_arc_wrapper_delegates() {
        let transcriber = Arc::new(MockTranscriber::new("shared").with_response("shared result"));
        let clone = Arc::clone(&transcriber);

        let audio = vec![0i16; 10];
        assert_eq!(clone.transcribe(&audio, "zh").unwrap(), "shared result");
        assert_eq!(transcriber.call_count(), 1);
    }
}
