//! Error types for scribed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScribedError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Audio chunk errors
    #[error("Audio format mismatch: expected {expected}, got {actual}")]
    FormatMismatch { expected: String, actual: String },

    #[error("Malformed audio chunk: {message}")]
    MalformedChunk { message: String },

    // Buffer errors
    #[error("Buffer overflow: dropped {dropped_ms} ms of oldest audio")]
    Overflow { dropped_ms: u64 },

    // Recognition errors
    #[error("Recognition model not found at {path}")]
    ModelNotFound { path: String },

    #[error("Recognizer failed: {message}")]
    Recognizer { message: String },

    // Protocol errors
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // Server errors
    #[error("Server error: {message}")]
    Server { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, ScribedError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_format_mismatch_display() {
        let error = ScribedError::FormatMismatch {
            expected: "16000 Hz mono".to_string(),
            actual: "44100 Hz stereo".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Audio format mismatch: expected 16000 Hz mono, got 44100 Hz stereo"
        );
    }

    #[test]
    fn test_malformed_chunk_display() {
        let error = ScribedError::MalformedChunk {
            message: "odd byte length".to_string(),
        };
        assert_eq!(error.to_string(), "Malformed audio chunk: odd byte length");
    }

    #[test]
    fn test_overflow_display() {
        let error = ScribedError::Overflow { dropped_ms: 1500 };
        assert_eq!(
            error.to_string(),
            "Buffer overflow: dropped 1500 ms of oldest audio"
        );
    }

    #[test]
    fn test_recognizer_display() {
        let error = ScribedError::Recognizer {
            message: "decoding failed".to_string(),
        };
        assert_eq!(error.to_string(), "Recognizer failed: decoding failed");
    }

    #[test]
    fn test_protocol_display() {
        let error = ScribedError::Protocol {
            message: "stop received while idle".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Protocol error: stop received while idle"
        );
    }

    #[test]
    fn test_model_not_found_display() {
        let error = ScribedError::ModelNotFound {
            path: "/models/ggml-medium.bin".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Recognition model not found at /models/ggml-medium.bin"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: ScribedError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_str = "invalid = toml = syntax";
        let toml_error = toml::from_str::<toml::Value>(toml_str).unwrap_err();
        let error: ScribedError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<ScribedError>();
        assert_sync::<ScribedError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
