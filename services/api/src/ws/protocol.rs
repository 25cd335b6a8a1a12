//! Defines the WebSocket message protocol between the browser client and the API server.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An audio turn from the browser. The browser transcribes speech itself, so the
/// only field the server reads is the optional transcription.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct AudioPayload {
    #[serde(default)]
    pub text: Option<String>,
}

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Raw audio turn; queued while a call is in flight.
    AudioData { audio: AudioPayload },
    /// Speech already transcribed by the browser.
    VoiceTextInput { text: String },
    /// Typed chat input.
    TextInput { text: String },
    /// Drops queued work and resets the session to idle.
    Interrupt,
    /// Application-level keepalive.
    Ping,
    /// Any `type` this server does not know. Logged and otherwise ignored.
    #[serde(other)]
    Unknown,
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent once after connect, when model initialization has resolved.
    SessionReady {
        session_id: Uuid,
        model_ready: bool,
        timestamp: i64,
    },
    /// The text of one successful generation call.
    AiResponse {
        text: String,
        session_id: Uuid,
        is_voice_response: bool,
        timestamp: i64,
    },
    /// A malformed frame or a failed generation call.
    Error { message: String, session_id: Uuid },
    /// Confirms an `interrupt`.
    Interrupted { session_id: Uuid, timestamp: i64 },
    /// Reply to `ping`.
    Pong { timestamp: i64 },
}

/// Milliseconds since the Unix epoch, as used in every outbound `timestamp`.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
