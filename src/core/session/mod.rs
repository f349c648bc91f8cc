//! The realtime session seam.
//!
//! `RealtimeSession` is the narrow interface the client adapter sees; the
//! OpenAI WebSocket transport lives behind it, and tests substitute a fake.

mod base;
mod history;
pub mod openai;

pub use base::{
    RealtimeSession, SessionError, SessionEvent, SessionEventCallback, SessionFactory,
    SessionParams, SessionResult, TransportAudio,
};
pub use history::{ContentPart, HistoryItem};
