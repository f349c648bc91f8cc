//! Client event vocabulary and the observer registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::audio::AudioRef;

/// Connection state of the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Credential fetch or transport negotiation in progress
    Connecting,
    /// Connected and ready
    Connected,
    /// Not connected
    #[default]
    Disconnected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "connecting"),
            ConnectionStatus::Connected => write!(f, "connected"),
            ConnectionStatus::Disconnected => write!(f, "disconnected"),
        }
    }
}

/// Author role of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    Assistant,
    User,
    System,
}

/// Which side of the conversation produced a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageSource {
    Assistant,
    User,
}

/// A text turn, immutable once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    /// Item ID (provider-assigned, or `client-<uuid>` for local echoes)
    pub id: String,
    /// Author role
    pub role: MessageRole,
    /// Message text
    pub text: String,
    /// Originating side
    pub source: MessageSource,
}

/// Where an audio clip came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioOrigin {
    /// Replayed from a session history entry
    History,
    /// Streamed directly from the transport
    Transport,
}

/// An audio clip ready for playback.
///
/// The clip's bytes live in the client's [`super::AudioStore`]; release the
/// reference once playback ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    /// Item or response ID from the provider
    pub id: String,
    /// Playable reference into the audio store
    pub audio: AudioRef,
    /// Transcript, when the provider supplied one
    pub transcript: Option<String>,
    /// Clip origin
    pub origin: AudioOrigin,
}

/// Events emitted by the client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Connection state changed
    Status(ConnectionStatus),
    /// A text turn arrived (or was sent locally)
    Message(MessagePayload),
    /// An audio clip is ready for playback
    Audio(AudioPayload),
    /// A failure occurred; session errors are passed through unchanged
    Error(serde_json::Value),
}

/// Discriminant for event subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Status,
    Message,
    Audio,
    Error,
}

impl ClientEvent {
    /// The subscription kind this event dispatches to.
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::Status(_) => EventKind::Status,
            ClientEvent::Message(_) => EventKind::Message,
            ClientEvent::Audio(_) => EventKind::Audio,
            ClientEvent::Error(_) => EventKind::Error,
        }
    }
}

/// Handler invoked synchronously for each matching event.
pub type EventHandler = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Subscription handle returned by [`EventDispatcher::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerId(u64);

/// Observer registry: per-kind ordered handler lists.
///
/// Handlers run synchronously in subscription order on whatever task the
/// triggering event arrived on. The handler list is snapshotted before
/// invocation, so handlers may subscribe or unsubscribe mid-dispatch.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Mutex<HashMap<EventKind, Vec<(HandlerId, EventHandler)>>>,
    next_id: AtomicU64,
}

impl EventDispatcher {
    /// Create an empty dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for an event kind.
    pub fn subscribe(&self, kind: EventKind, handler: EventHandler) -> HandlerId {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .entry(kind)
            .or_default()
            .push((id, handler));
        id
    }

    /// Remove a handler. Returns whether it was registered.
    pub fn unsubscribe(&self, kind: EventKind, id: HandlerId) -> bool {
        let mut handlers = self.handlers.lock();
        match handlers.get_mut(&kind) {
            Some(list) => {
                let before = list.len();
                list.retain(|(handler_id, _)| *handler_id != id);
                list.len() != before
            }
            None => false,
        }
    }

    /// Invoke all handlers registered for the event's kind, in order.
    pub fn emit(&self, event: &ClientEvent) {
        let snapshot: Vec<EventHandler> = {
            let handlers = self.handlers.lock();
            handlers
                .get(&event.kind())
                .map(|list| list.iter().map(|(_, h)| h.clone()).collect())
                .unwrap_or_default()
        };
        for handler in snapshot {
            handler(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex as PlMutex;

    fn status_event() -> ClientEvent {
        ClientEvent::Status(ConnectionStatus::Connected)
    }

    #[test]
    fn test_handlers_run_in_subscription_order() {
        let dispatcher = EventDispatcher::new();
        let order: Arc<PlMutex<Vec<u8>>> = Arc::new(PlMutex::new(Vec::new()));

        for tag in [1u8, 2, 3] {
            let order = order.clone();
            dispatcher.subscribe(
                EventKind::Status,
                Arc::new(move |_| order.lock().push(tag)),
            );
        }

        dispatcher.emit(&status_event());
        assert_eq!(*order.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let dispatcher = EventDispatcher::new();
        let count = Arc::new(PlMutex::new(0u32));

        let counter = count.clone();
        let id = dispatcher.subscribe(EventKind::Status, Arc::new(move |_| *counter.lock() += 1));

        dispatcher.emit(&status_event());
        assert!(dispatcher.unsubscribe(EventKind::Status, id));
        dispatcher.emit(&status_event());

        assert_eq!(*count.lock(), 1);
        // Second removal reports not-found
        assert!(!dispatcher.unsubscribe(EventKind::Status, id));
    }

    #[test]
    fn test_events_only_reach_matching_kind() {
        let dispatcher = EventDispatcher::new();
        let count = Arc::new(PlMutex::new(0u32));

        let counter = count.clone();
        dispatcher.subscribe(EventKind::Message, Arc::new(move |_| *counter.lock() += 1));

        dispatcher.emit(&status_event());
        assert_eq!(*count.lock(), 0);
    }

    #[test]
    fn test_unsubscribe_during_dispatch_is_safe() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let removed: Arc<PlMutex<Option<HandlerId>>> = Arc::new(PlMutex::new(None));
        let second_ran = Arc::new(PlMutex::new(false));

        // First handler removes the second one mid-dispatch; the snapshot
        // still delivers this emit to both.
        let d = dispatcher.clone();
        let target = removed.clone();
        dispatcher.subscribe(
            EventKind::Status,
            Arc::new(move |_| {
                if let Some(id) = target.lock().take() {
                    d.unsubscribe(EventKind::Status, id);
                }
            }),
        );

        let ran = second_ran.clone();
        let id = dispatcher.subscribe(EventKind::Status, Arc::new(move |_| *ran.lock() = true));
        *removed.lock() = Some(id);

        dispatcher.emit(&status_event());
        assert!(*second_ran.lock());

        // Next emit no longer reaches the removed handler
        *second_ran.lock() = false;
        dispatcher.emit(&status_event());
        assert!(!*second_ran.lock());
    }
}
