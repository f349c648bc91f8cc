//! Base trait and types for realtime sessions.
//!
//! The session is an opaque external collaborator as far as the client
//! adapter is concerned: it exposes connect/close, text send, a mute surface,
//! and a single event callback. Everything provider-specific stays behind
//! this trait so the adapter logic is testable with a fake implementation.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use super::history::HistoryItem;
use crate::core::client::ConnectionStatus;

/// Errors reported by a realtime session transport.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Connection to the provider failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Not connected
    #[error("Not connected")]
    NotConnected,

    /// WebSocket error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// A raw audio chunk from the transport.
#[derive(Debug, Clone)]
pub struct TransportAudio {
    /// Response ID the chunk belongs to
    pub response_id: String,
    /// Raw audio bytes (PCM 16-bit, 24kHz, mono, little-endian)
    pub data: Bytes,
}

/// Events a session reports to its owner.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The transport connection state changed
    ConnectionChange(ConnectionStatus),
    /// A raw audio chunk arrived on the transport
    Audio(TransportAudio),
    /// A conversation item was appended to the session history
    HistoryAdded(HistoryItem),
    /// The session reported an error; the value is passed through unchanged
    Error(serde_json::Value),
}

/// Callback invoked for every session event.
pub type SessionEventCallback = Arc<dyn Fn(SessionEvent) + Send + Sync>;

/// Parameters for constructing a session.
#[derive(Debug, Clone)]
pub struct SessionParams {
    /// Realtime model id
    pub model: String,
    /// System instructions for the assistant
    pub instructions: String,
    /// Display name for the agent
    pub agent_name: String,
}

/// Narrow interface over a provider realtime session.
#[async_trait]
pub trait RealtimeSession: Send + Sync {
    /// Establish the transport using a short-lived client secret.
    async fn connect(&mut self, client_secret: &str) -> SessionResult<()>;

    /// Close the underlying transport. Infallible by contract; a session
    /// that is already closed does nothing.
    async fn close(&mut self);

    /// Send a user text message and request a response.
    async fn send_message(&mut self, text: &str) -> SessionResult<()>;

    /// Mute or unmute the transport's audio input.
    async fn set_muted(&mut self, muted: bool) -> SessionResult<()>;

    /// Whether the input is muted; `None` until the transport has reported
    /// a mute flag.
    fn muted(&self) -> Option<bool>;

    /// Attach the event callback. Replaces any previous callback.
    fn set_event_callback(&mut self, callback: SessionEventCallback);

    /// Detach the event callback; subsequent transport events are dropped.
    fn clear_event_callback(&mut self);
}

/// Factory seam for session construction, injectable for tests.
pub trait SessionFactory: Send + Sync {
    /// Create a new, unconnected session.
    fn create(&self, params: SessionParams) -> Box<dyn RealtimeSession>;
}
