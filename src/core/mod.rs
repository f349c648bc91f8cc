//! Core realtime functionality.
//!
//! - `session`: the narrow transport seam (`RealtimeSession` trait) and its
//!   OpenAI WebSocket implementation
//! - `client`: the `RealtimeClient` adapter that owns a session and
//!   normalizes its events for a UI

pub mod client;
pub mod session;

pub use client::{
    AudioOrigin, AudioPayload, AudioRef, AudioStore, ClientEvent, ConnectionStatus,
    EventDispatcher, EventKind, HandlerId, MessagePayload, MessageRole, MessageSource,
    RealtimeClient, RealtimeClientOptions,
};
pub use session::{
    ContentPart, HistoryItem, RealtimeSession, SessionError, SessionEvent, SessionEventCallback,
    SessionFactory, SessionParams, SessionResult, TransportAudio,
};
pub use session::openai::{OPENAI_REALTIME_WS_URL, OpenAiSession, OpenAiSessionFactory};
