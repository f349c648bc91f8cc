//! OpenAI Realtime API WebSocket message types.
//!
//! Only the slice of the protocol this client uses:
//!
//! Client events (sent to server):
//! - session.update - set instructions after connect
//! - conversation.item.create - append a user text message
//! - response.create - request a model response
//! - input_audio_buffer.clear - drop buffered input audio (used on mute)
//!
//! Server events (received from server):
//! - session.created - session is established
//! - response.audio.delta - audio chunk (base64)
//! - response.output_item.done - completed conversation item
//! - error - provider error

use serde::{Deserialize, Serialize};

use crate::core::session::HistoryItem;

/// Session configuration sent via `session.update`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionUpdate {
    /// System instructions for the assistant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// A conversation item created by the client.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingItem {
    #[serde(rename = "type")]
    pub item_type: &'static str,
    pub role: &'static str,
    pub content: Vec<OutgoingContent>,
}

/// Content of a client-created conversation item.
#[derive(Debug, Clone, Serialize)]
pub struct OutgoingContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

impl OutgoingItem {
    /// Build a user text message item.
    pub fn user_text(text: &str) -> Self {
        Self {
            item_type: "message",
            role: "user",
            content: vec![OutgoingContent {
                content_type: "input_text",
                text: text.to_string(),
            }],
        }
    }
}

/// Events sent to the server.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ClientWireEvent {
    /// Update session configuration
    #[serde(rename = "session.update")]
    SessionUpdate { session: SessionUpdate },

    /// Append an item to the conversation
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate { item: OutgoingItem },

    /// Request a response from the model
    #[serde(rename = "response.create")]
    ResponseCreate {},

    /// Clear the input audio buffer
    #[serde(rename = "input_audio_buffer.clear")]
    InputAudioBufferClear {},
}

/// Session descriptor from `session.created`.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionCreated {
    /// Provider session ID
    pub id: String,
}

/// Events received from the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum ServerWireEvent {
    /// Session established
    #[serde(rename = "session.created")]
    SessionCreated { session: SessionCreated },

    /// Audio chunk, base64 encoded
    #[serde(rename = "response.audio.delta")]
    AudioDelta {
        response_id: String,
        delta: String,
    },

    /// A completed conversation item
    #[serde(rename = "response.output_item.done")]
    OutputItemDone { item: HistoryItem },

    /// Provider error
    #[serde(rename = "error")]
    Error { error: serde_json::Value },

    /// Anything this client does not handle
    #[serde(other)]
    Other,
}
