//! TOML configuration with environment overrides.

use crate::defaults;
use crate::server::protocol::ServerMode;
use crate::session::scheduler::SchedulerConfig;
use crate::session::session::SessionConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub audio: AudioConfig,
    pub vad: VadConfig,
    pub scheduler: SchedulerSection,
    pub stt: SttConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    pub mode: ServerMode,
}

/// Session audio format and buffering configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub buffer_capacity_secs: u32,
}

/// Silence detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VadConfig {
    pub silence_threshold: f32,
    pub min_silence_ms: u32,
}

/// Recognition trigger configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulerSection {
    pub trigger_interval_ms: u32,
    pub max_window_secs: u32,
}

/// Speech-to-text configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SttConfig {
    pub model_path: String,
    pub language: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: defaults::DEFAULT_BIND.to_string(),
            port: defaults::DEFAULT_PORT,
            mode: ServerMode::Streaming,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            sample_rate: defaults::SAMPLE_RATE,
            channels: defaults::CHANNELS,
            buffer_capacity_secs: defaults::BUFFER_CAPACITY_SECS,
        }
    }
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            silence_threshold: defaults::SILENCE_THRESHOLD,
            min_silence_ms: defaults::MIN_SILENCE_MS,
        }
    }
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            trigger_interval_ms: defaults::TRIGGER_INTERVAL_MS,
            max_window_secs: defaults::MAX_WINDOW_SECS,
        }
    }
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            model_path: defaults::DEFAULT_MODEL_PATH.to_string(),
            language: defaults::DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, falling back to defaults only when the
    /// file is missing. Invalid TOML is still an error.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                if e.downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false)
                {
                    Ok(Self::default())
                } else {
                    Err(e)
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SCRIBED_MODEL → stt.model_path
    /// - SCRIBED_LANGUAGE → stt.language
    /// - SCRIBED_BIND → server.bind
    /// - SCRIBED_PORT → server.port
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(model) = std::env::var("SCRIBED_MODEL")
            && !model.is_empty()
        {
            self.stt.model_path = model;
        }

        if let Ok(language) = std::env::var("SCRIBED_LANGUAGE")
            && !language.is_empty()
        {
            self.stt.language = language;
        }

        if let Ok(bind) = std::env::var("SCRIBED_BIND")
            && !bind.is_empty()
        {
            self.server.bind = bind;
        }

        if let Ok(port) = std::env::var("SCRIBED_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }

        self
    }

    /// Default config file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scribed")
            .join("config.toml")
    }

    /// Derives per-session engine settings from this configuration.
    pub fn session_config(&self) -> SessionConfig {
        let streaming = self.server.mode == ServerMode::Streaming;
        SessionConfig {
            ring: crate::audio::buffer::RingBufferConfig {
                sample_rate: self.audio.sample_rate,
                channels: self.audio.channels,
                capacity_secs: self.audio.buffer_capacity_secs,
            },
            detector: crate::audio::vad::SilenceDetectorConfig {
                silence_threshold: self.vad.silence_threshold,
                min_silence_ms: self.vad.min_silence_ms,
                frame_ms: defaults::VAD_FRAME_MS,
            },
            scheduler: SchedulerConfig {
                trigger_interval_ms: self.scheduler.trigger_interval_ms,
                max_window_secs: self.scheduler.max_window_secs,
                emit_partials: streaming,
                detect_boundaries: streaming,
            },
            language: self.stt.language.clone(),
        }
    }
}
