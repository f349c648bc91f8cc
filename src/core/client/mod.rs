//! Native realtime client.
//!
//! `RealtimeClient` owns one realtime session, fetches connection credentials
//! from the gateway's session endpoint, and normalizes transport events into
//! a four-event vocabulary (`status`, `message`, `audio`, `error`) for a UI.

mod adapter;
mod audio;
mod events;

pub use adapter::{RealtimeClient, RealtimeClientOptions};
pub use audio::{AudioRef, AudioStore};
pub use events::{
    AudioOrigin, AudioPayload, ClientEvent, ConnectionStatus, EventDispatcher, EventHandler,
    EventKind, HandlerId, MessagePayload, MessageRole, MessageSource,
};
