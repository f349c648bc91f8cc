//! OpenAI Realtime WebSocket session.

mod client;
mod messages;

pub use client::{OPENAI_REALTIME_WS_URL, OpenAiSession, OpenAiSessionFactory};
