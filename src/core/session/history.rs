//! Conversation history item shapes.
//!
//! A history item is a provider-reported unit of conversation state (a
//! message or audio turn) retroactively appended to the session's record.
//! Audio content arrives base64 encoded in the transport encoding.

use serde::{Deserialize, Serialize};

/// A conversation item appended to the session history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryItem {
    /// Item ID from the provider
    #[serde(rename = "id")]
    pub item_id: String,
    /// Item type (only "message" items carry content the client renders)
    #[serde(rename = "type")]
    pub item_type: String,
    /// Author role (assistant, user, system)
    #[serde(default)]
    pub role: Option<String>,
    /// Content fragments
    #[serde(default)]
    pub content: Vec<ContentPart>,
}

impl HistoryItem {
    /// Whether this is an assistant-authored message item.
    pub fn is_assistant_message(&self) -> bool {
        self.item_type == "message" && self.role.as_deref() == Some("assistant")
    }
}

/// A content fragment within a history item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentPart {
    /// Text output from the assistant
    #[serde(rename = "output_text")]
    OutputText {
        /// The text fragment
        text: String,
    },
    /// Audio output from the assistant
    #[serde(rename = "output_audio")]
    OutputAudio {
        /// Base64-encoded audio bytes, when the provider included them
        #[serde(default)]
        audio: Option<String>,
        /// Transcript of the audio, when the provider supplied one
        #[serde(default)]
        transcript: Option<String>,
    },
    /// Anything this client does not render
    #[serde(other)]
    Other,
}
