//! JSON wire protocol between clients and the server.
//!
//! Control messages are structured text; audio travels as binary frames and
//! never appears here. Events carry a `type` discriminator, commands a
//! `command` discriminator.

use serde::{Deserialize, Serialize};

/// Mode the server runs in, advertised in the `connected` event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    /// Partial results as audio accumulates, finals at utterance boundaries.
    #[default]
    Streaming,
    /// One final result on stop; no partials, no silence boundaries.
    SingleShot,
}

impl ServerMode {
    /// Wire-format name of the mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerMode::Streaming => "streaming",
            ServerMode::SingleShot => "single_shot",
        }
    }
}

/// Commands sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientCommand {
    /// Begin a new session
    Start,
    /// Close the current utterance and end the session
    Stop,
    /// Liveness check
    Ping,
}

impl ClientCommand {
    /// Serialize command to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize command from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// Events sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent once on connection open
    Connected { message: String, mode: ServerMode },
    /// Ack for `start`
    SessionStarted,
    /// Intermediate transcript; may be revised by a later result
    Partial { text: String, is_final: bool },
    /// Transcript for a closed utterance; immutable once emitted
    Final { text: String, is_final: bool },
    /// Non-fatal diagnostic; the session continues
    Error { message: String },
    /// Sent after the terminal `final` following `stop`
    SessionEnded,
    /// Ack for `ping`
    Pong,
}

impl ServerEvent {
    /// An intermediate transcript event.
    pub fn partial(text: impl Into<String>) -> Self {
        Self::Partial {
            text: text.into(),
            is_final: false,
        }
    }

    /// A finalized transcript event.
    pub fn final_result(text: impl Into<String>) -> Self {
        Self::Final {
            text: text.into(),
            is_final: true,
        }
    }

    /// A diagnostic event.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// Serialize event to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize event from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
