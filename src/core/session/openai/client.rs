//! OpenAI Realtime WebSocket session implementation.
//!
//! Implements [`RealtimeSession`] over OpenAI's WebSocket Realtime API,
//! authenticating with the short-lived client secret minted by the gateway's
//! session endpoint.
//!
//! # API Reference
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Protocol: WebSocket with JSON events
//! - Audio: PCM 16-bit, 24kHz, mono, little-endian, base64 encoded

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use base64::prelude::*;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};

use super::messages::{ClientWireEvent, OutgoingItem, ServerWireEvent, SessionUpdate};
use crate::core::client::ConnectionStatus;
use crate::core::session::base::{
    RealtimeSession, SessionError, SessionEvent, SessionEventCallback, SessionFactory,
    SessionParams, SessionResult, TransportAudio,
};

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_WS_URL: &str = "wss://api.openai.com/v1/realtime";

/// Channel capacity for outgoing WebSocket messages.
const WS_CHANNEL_CAPACITY: usize = 256;

type SharedCallback = Arc<RwLock<Option<SessionEventCallback>>>;

/// OpenAI Realtime session over WebSocket.
///
/// State shared with the spawned read loop lives behind `Arc`; the `connected`
/// flag uses `AtomicBool` for lock-free checks.
pub struct OpenAiSession {
    params: SessionParams,
    connected: Arc<AtomicBool>,
    muted: Arc<RwLock<Option<bool>>>,
    callback: SharedCallback,
    sender: Option<mpsc::Sender<ClientWireEvent>>,
    task: Option<JoinHandle<()>>,
}

impl OpenAiSession {
    /// Create a new, unconnected session.
    pub fn new(params: SessionParams) -> Self {
        Self {
            params,
            connected: Arc::new(AtomicBool::new(false)),
            muted: Arc::new(RwLock::new(None)),
            callback: Arc::new(RwLock::new(None)),
            sender: None,
            task: None,
        }
    }

    fn build_ws_url(&self) -> String {
        format!("{}?model={}", OPENAI_REALTIME_WS_URL, self.params.model)
    }

    /// Invoke the attached callback, if any, outside the lock.
    fn emit(callback: &SharedCallback, event: SessionEvent) {
        let cb = callback.read().clone();
        if let Some(cb) = cb {
            cb(event);
        }
    }

    /// Dispatch an incoming wire event to the session callback.
    fn handle_server_event(event: ServerWireEvent, callback: &SharedCallback) {
        match event {
            ServerWireEvent::SessionCreated { session } => {
                tracing::info!("Realtime session created: {}", session.id);
            }

            ServerWireEvent::AudioDelta { response_id, delta } => {
                match BASE64_STANDARD.decode(&delta) {
                    Ok(audio_bytes) => {
                        Self::emit(
                            callback,
                            SessionEvent::Audio(TransportAudio {
                                response_id,
                                data: Bytes::from(audio_bytes),
                            }),
                        );
                    }
                    Err(e) => {
                        tracing::error!("Failed to decode audio delta: {e}");
                    }
                }
            }

            ServerWireEvent::OutputItemDone { item } => {
                Self::emit(callback, SessionEvent::HistoryAdded(item));
            }

            ServerWireEvent::Error { error } => {
                tracing::error!("Realtime session error: {error}");
                Self::emit(callback, SessionEvent::Error(error));
            }

            ServerWireEvent::Other => {
                tracing::trace!("Unhandled server event");
            }
        }
    }

    async fn send_event(&self, event: ClientWireEvent) -> SessionResult<()> {
        match self.sender.as_ref() {
            Some(sender) => sender
                .send(event)
                .await
                .map_err(|e| SessionError::WebSocket(e.to_string())),
            None => Err(SessionError::NotConnected),
        }
    }
}

#[async_trait]
impl RealtimeSession for OpenAiSession {
    async fn connect(&mut self, client_secret: &str) -> SessionResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            return Ok(());
        }

        let url = self.build_ws_url();
        let request = http::Request::builder()
            .uri(&url)
            .header("Authorization", format!("Bearer {client_secret}"))
            .header("OpenAI-Beta", "realtime=v1")
            .header(
                "Sec-WebSocket-Key",
                tungstenite::handshake::client::generate_key(),
            )
            .header("Sec-WebSocket-Version", "13")
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Host", "api.openai.com")
            .body(())
            .map_err(|e| SessionError::ConnectionFailed(e.to_string()))?;

        let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| SessionError::ConnectionFailed(e.to_string()))?;

        tracing::info!(agent = %self.params.agent_name, "Connected to OpenAI Realtime API");

        let (mut ws_sink, mut ws_stream) = ws_stream.split();
        let (tx, mut rx) = mpsc::channel::<ClientWireEvent>(WS_CHANNEL_CAPACITY);
        self.sender = Some(tx);

        // Queue the instructions now, before any task exists: the read loop
        // drains the channel once it starts, and a failure here unwinds with
        // nothing left running.
        if let Err(e) = self
            .send_event(ClientWireEvent::SessionUpdate {
                session: SessionUpdate {
                    instructions: Some(self.params.instructions.clone()),
                },
            })
            .await
        {
            self.sender = None;
            return Err(e);
        }

        let callback = self.callback.clone();
        let connected = self.connected.clone();

        self.connected.store(true, Ordering::SeqCst);
        // Transport is up; input starts unmuted
        *self.muted.write() = Some(false);

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(event) = rx.recv() => {
                        let json = match serde_json::to_string(&event) {
                            Ok(j) => j,
                            Err(e) => {
                                tracing::error!("Failed to serialize event: {e}");
                                continue;
                            }
                        };

                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            tracing::error!("Failed to send WebSocket message: {e}");
                            break;
                        }
                    }

                    Some(msg) = ws_stream.next() => {
                        match msg {
                            Ok(Message::Text(text)) => {
                                match serde_json::from_str::<ServerWireEvent>(&text) {
                                    Ok(event) => Self::handle_server_event(event, &callback),
                                    Err(e) => {
                                        tracing::warn!("Failed to parse server event: {e} - {text}");
                                    }
                                }
                            }
                            Ok(Message::Close(_)) => {
                                tracing::info!("WebSocket closed by server");
                                break;
                            }
                            Ok(Message::Ping(data)) => {
                                if let Err(e) = ws_sink.send(Message::Pong(data)).await {
                                    tracing::error!("Failed to send pong: {e}");
                                }
                            }
                            Err(e) => {
                                tracing::error!("WebSocket error: {e}");
                                break;
                            }
                            _ => {}
                        }
                    }

                    else => break,
                }
            }

            connected.store(false, Ordering::SeqCst);
            Self::emit(
                &callback,
                SessionEvent::ConnectionChange(ConnectionStatus::Disconnected),
            );
            tracing::info!("Realtime connection task ended");
        });
        self.task = Some(handle);

        Ok(())
    }

    async fn close(&mut self) {
        self.sender = None;
        if let Some(handle) = self.task.take() {
            handle.abort();
        }
        self.connected.store(false, Ordering::SeqCst);
        *self.muted.write() = None;
        tracing::info!("Disconnected from OpenAI Realtime API");
    }

    async fn send_message(&mut self, text: &str) -> SessionResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SessionError::NotConnected);
        }

        self.send_event(ClientWireEvent::ConversationItemCreate {
            item: OutgoingItem::user_text(text),
        })
        .await?;
        self.send_event(ClientWireEvent::ResponseCreate {}).await
    }

    async fn set_muted(&mut self, muted: bool) -> SessionResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(SessionError::NotConnected);
        }

        *self.muted.write() = Some(muted);
        if muted {
            // Drop anything already buffered so a muted mic goes silent now
            self.send_event(ClientWireEvent::InputAudioBufferClear {})
                .await?;
        }
        Ok(())
    }

    fn muted(&self) -> Option<bool> {
        *self.muted.read()
    }

    fn set_event_callback(&mut self, callback: SessionEventCallback) {
        *self.callback.write() = Some(callback);
    }

    fn clear_event_callback(&mut self) {
        *self.callback.write() = None;
    }
}

/// Factory producing [`OpenAiSession`] instances.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAiSessionFactory;

impl SessionFactory for OpenAiSessionFactory {
    fn create(&self, params: SessionParams) -> Box<dyn RealtimeSession> {
        Box::new(OpenAiSession::new(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SessionParams {
        SessionParams {
            model: "gpt-realtime-mini".to_string(),
            instructions: "be brief".to_string(),
            agent_name: "Test Agent".to_string(),
        }
    }

    #[test]
    fn test_build_ws_url() {
        let session = OpenAiSession::new(params());
        let url = session.build_ws_url();
        assert!(url.starts_with("wss://api.openai.com/v1/realtime"));
        assert!(url.contains("model=gpt-realtime-mini"));
    }

    #[test]
    fn test_mute_flag_unknown_before_connect() {
        let session = OpenAiSession::new(params());
        assert_eq!(session.muted(), None);
    }

    #[tokio::test]
    async fn test_send_message_requires_connection() {
        let mut session = OpenAiSession::new(params());
        match session.send_message("hello").await {
            Err(SessionError::NotConnected) => {}
            other => panic!("Expected NotConnected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_set_muted_requires_connection() {
        let mut session = OpenAiSession::new(params());
        assert!(matches!(
            session.set_muted(true).await,
            Err(SessionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_failed_connect_leaves_no_residue() {
        let mut session = OpenAiSession::new(SessionParams {
            model: "not a valid model".to_string(),
            instructions: "be brief".to_string(),
            agent_name: "Test Agent".to_string(),
        });

        match session.connect("ek_test").await {
            Err(SessionError::ConnectionFailed(_)) => {}
            other => panic!("Expected ConnectionFailed, got {other:?}"),
        }

        assert_eq!(session.muted(), None);
        assert!(matches!(
            session.send_message("hello").await,
            Err(SessionError::NotConnected)
        ));
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let mut session = OpenAiSession::new(params());
        session.close().await;
        session.close().await;
        assert_eq!(session.muted(), None);
    }

    #[test]
    fn test_audio_delta_dispatch() {
        let received: Arc<parking_lot::Mutex<Vec<SessionEvent>>> =
            Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = received.clone();
        let callback: SharedCallback = Arc::new(RwLock::new(Some(Arc::new(
            move |event: SessionEvent| sink.lock().push(event),
        )
            as SessionEventCallback)));

        let encoded = BASE64_STANDARD.encode([1u8, 2, 3]);
        OpenAiSession::handle_server_event(
            ServerWireEvent::AudioDelta {
                response_id: "resp_1".to_string(),
                delta: encoded,
            },
            &callback,
        );

        let events = received.lock();
        assert_eq!(events.len(), 1);
        match &events[0] {
            SessionEvent::Audio(audio) => {
                assert_eq!(audio.response_id, "resp_1");
                assert_eq!(audio.data.as_ref(), &[1, 2, 3]);
            }
            other => panic!("Unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_undecodable_audio_is_dropped() {
        let received: Arc<parking_lot::Mutex<Vec<SessionEvent>>> =
            Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = received.clone();
        let callback: SharedCallback = Arc::new(RwLock::new(Some(Arc::new(
            move |event: SessionEvent| sink.lock().push(event),
        )
            as SessionEventCallback)));

        OpenAiSession::handle_server_event(
            ServerWireEvent::AudioDelta {
                response_id: "resp_1".to_string(),
                delta: "not base64!!!".to_string(),
            },
            &callback,
        );

        assert!(received.lock().is_empty());
    }
}
