//! The realtime client adapter.
//!
//! Owns at most one live [`RealtimeSession`], drives the connect flow
//! (credential fetch, session construction, transport negotiation), and
//! remaps transport events into the client event vocabulary. All failures
//! surface as `error` events; `connect()` additionally returns them so the
//! caller can react directly.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use super::audio::AudioStore;
use super::events::{
    AudioOrigin, AudioPayload, ClientEvent, ConnectionStatus, EventDispatcher, EventHandler,
    EventKind, HandlerId, MessagePayload, MessageRole, MessageSource,
};
use crate::core::session::openai::OpenAiSessionFactory;
use crate::core::session::{
    ContentPart, HistoryItem, RealtimeSession, SessionEvent, SessionEventCallback, SessionFactory,
    SessionParams,
};
use crate::errors::client_error::{ClientError, ClientResult};

/// Default path of the credential endpoint, relative to the server URL.
pub const DEFAULT_ENDPOINT: &str = "/api/session";

/// Default gateway origin for relative endpoints.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

/// Default realtime model.
pub const DEFAULT_MODEL: &str = "gpt-realtime-mini";

/// Default persona prompt, carried over from the demo this gateway serves.
const DEFAULT_INSTRUCTIONS: &str = "당신은 한국어만 사용하는 실시간 어시스턴트입니다. \
     모든 응답은 자연스럽고, 정중하며 어휘는 일관되게 한국어로만 제공하세요.";

/// Default agent display name.
const DEFAULT_AGENT_NAME: &str = "Realtime Demo Agent";

/// Constructor-time options for [`RealtimeClient`].
#[derive(Debug, Clone)]
pub struct RealtimeClientOptions {
    /// Credential endpoint; absolute URL or a path joined to `server_url`
    pub endpoint: String,
    /// Gateway origin used when `endpoint` is a path
    pub server_url: String,
    /// Realtime model id
    pub model: String,
    /// System instructions for the assistant
    pub instructions: String,
    /// Agent display name
    pub agent_name: String,
}

impl Default for RealtimeClientOptions {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            server_url: DEFAULT_SERVER_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            instructions: DEFAULT_INSTRUCTIONS.to_string(),
            agent_name: DEFAULT_AGENT_NAME.to_string(),
        }
    }
}

/// Native realtime client.
///
/// At most one session is live at a time; `connect()` while a session exists
/// is a no-op, and a new session replaces (never pools) the old one after an
/// explicit `disconnect()`. The client never retries on its own.
pub struct RealtimeClient {
    options: RealtimeClientOptions,
    http: reqwest::Client,
    factory: Box<dyn SessionFactory>,
    session: Option<Box<dyn RealtimeSession>>,
    status: Arc<RwLock<ConnectionStatus>>,
    dispatcher: Arc<EventDispatcher>,
    audio: Arc<AudioStore>,
}

impl RealtimeClient {
    /// Create a client backed by the OpenAI WebSocket transport.
    pub fn new(options: RealtimeClientOptions) -> Self {
        Self::with_factory(options, Box::new(OpenAiSessionFactory))
    }

    /// Create a client with an injected session factory (used by tests).
    pub fn with_factory(options: RealtimeClientOptions, factory: Box<dyn SessionFactory>) -> Self {
        Self {
            options,
            http: reqwest::Client::new(),
            factory,
            session: None,
            status: Arc::new(RwLock::new(ConnectionStatus::Disconnected)),
            dispatcher: Arc::new(EventDispatcher::new()),
            audio: Arc::new(AudioStore::new()),
        }
    }

    /// Register an event handler. Handlers run synchronously, in
    /// subscription order, on the task the triggering event arrived on.
    pub fn on(&self, kind: EventKind, handler: EventHandler) -> HandlerId {
        self.dispatcher.subscribe(kind, handler)
    }

    /// Remove a previously registered handler.
    pub fn off(&self, kind: EventKind, id: HandlerId) -> bool {
        self.dispatcher.unsubscribe(kind, id)
    }

    /// Current connection status.
    pub fn connection_status(&self) -> ConnectionStatus {
        *self.status.read()
    }

    /// Whether the client is connected.
    pub fn is_connected(&self) -> bool {
        self.connection_status() == ConnectionStatus::Connected
    }

    /// Whether the mic is actively capturing; `None` when unknown (no
    /// session, or the transport has not reported a mute flag yet).
    pub fn mic_state(&self) -> Option<bool> {
        self.session
            .as_ref()
            .and_then(|session| session.muted())
            .map(|muted| !muted)
    }

    /// The store holding emitted audio clips. Consumers release clips after
    /// playback; `disconnect()` clears the store.
    pub fn audio_store(&self) -> Arc<AudioStore> {
        self.audio.clone()
    }

    /// Connect: fetch a credential, build a session, negotiate transport.
    ///
    /// No-op when a session already exists. On failure the error is both
    /// emitted as an `error` event and returned, and the status lands back
    /// on `disconnected`.
    pub async fn connect(&mut self) -> ClientResult<()> {
        if self.session.is_some() {
            return Ok(());
        }

        self.set_status(ConnectionStatus::Connecting);

        let client_secret = match self.fetch_client_secret().await {
            Ok(secret) => secret,
            Err(error) => {
                self.fail_connect(&error);
                return Err(error);
            }
        };

        let mut session = self.factory.create(SessionParams {
            model: self.options.model.clone(),
            instructions: self.options.instructions.clone(),
            agent_name: self.options.agent_name.clone(),
        });
        session.set_event_callback(self.session_callback());

        match session.connect(&client_secret).await {
            Ok(()) => {
                self.session = Some(session);
                self.set_status(ConnectionStatus::Connected);
                Ok(())
            }
            Err(e) => {
                session.clear_event_callback();
                let error = ClientError::Transport(e.to_string());
                self.fail_connect(&error);
                Err(error)
            }
        }
    }

    /// Disconnect. Idempotent; always emits exactly one
    /// `status=disconnected` event, even when no session exists.
    pub async fn disconnect(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close().await;
            session.clear_event_callback();
            // Clips belong to the session that produced them
            self.audio.clear();
        }
        self.set_status(ConnectionStatus::Disconnected);
    }

    /// Send a text message.
    ///
    /// Requires a session; blank input (after trimming) is silently dropped.
    /// The local `message` event is emitted before the text is forwarded, so
    /// the UI shows the user's message regardless of any provider echo.
    pub async fn send_text(&mut self, message: &str) -> ClientResult<()> {
        let Some(session) = self.session.as_mut() else {
            return Err(ClientError::InvalidState(
                "realtime session is not connected".to_string(),
            ));
        };

        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        self.dispatcher.emit(&ClientEvent::Message(MessagePayload {
            id: format!("client-{}", Uuid::new_v4()),
            role: MessageRole::User,
            text: trimmed.to_string(),
            source: MessageSource::User,
        }));

        session
            .send_message(trimmed)
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    /// Unmute the transport's audio input. No-op when disconnected.
    pub async fn start_mic(&mut self) -> ClientResult<()> {
        match self.session.as_mut() {
            Some(session) => session
                .set_muted(false)
                .await
                .map_err(|e| ClientError::Transport(e.to_string())),
            None => Ok(()),
        }
    }

    /// Mute the transport's audio input. No-op when disconnected.
    pub async fn stop_mic(&mut self) -> ClientResult<()> {
        match self.session.as_mut() {
            Some(session) => session
                .set_muted(true)
                .await
                .map_err(|e| ClientError::Transport(e.to_string())),
            None => Ok(()),
        }
    }

    fn set_status(&self, status: ConnectionStatus) {
        *self.status.write() = status;
        self.dispatcher.emit(&ClientEvent::Status(status));
    }

    fn fail_connect(&self, error: &ClientError) {
        self.dispatcher
            .emit(&ClientEvent::Error(json!(error.to_string())));
        self.set_status(ConnectionStatus::Disconnected);
    }

    fn credential_url(&self) -> String {
        if self.options.endpoint.starts_with("http://")
            || self.options.endpoint.starts_with("https://")
        {
            self.options.endpoint.clone()
        } else {
            format!(
                "{}/{}",
                self.options.server_url.trim_end_matches('/'),
                self.options.endpoint.trim_start_matches('/')
            )
        }
    }

    async fn fetch_client_secret(&self) -> ClientResult<String> {
        let response = self
            .http
            .post(self.credential_url())
            .json(&json!({ "model": self.options.model }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Network {
                status: status.as_u16(),
                body,
            });
        }

        let payload = response.json::<serde_json::Value>().await?;
        extract_client_secret(&payload).ok_or_else(|| {
            ClientError::Credential("response did not contain a client secret value".to_string())
        })
    }

    /// Build the callback that remaps session events into client events.
    fn session_callback(&self) -> SessionEventCallback {
        let dispatcher = self.dispatcher.clone();
        let audio = self.audio.clone();
        let status = self.status.clone();

        Arc::new(move |event: SessionEvent| match event {
            SessionEvent::ConnectionChange(new_status) => {
                *status.write() = new_status;
                dispatcher.emit(&ClientEvent::Status(new_status));
            }
            SessionEvent::Audio(chunk) => {
                let clip = audio.insert(chunk.data);
                dispatcher.emit(&ClientEvent::Audio(AudioPayload {
                    id: chunk.response_id,
                    audio: clip,
                    transcript: None,
                    origin: AudioOrigin::Transport,
                }));
            }
            SessionEvent::HistoryAdded(item) => {
                handle_history_item(item, &dispatcher, &audio);
            }
            SessionEvent::Error(value) => {
                dispatcher.emit(&ClientEvent::Error(value));
            }
        })
    }
}

/// Remap a history entry into `message` and `audio` events.
///
/// Only assistant-authored message entries are rendered. Text fragments are
/// trimmed, empties dropped, and space-joined into one `message`; each
/// audio-bearing fragment is decoded and emitted as its own `audio` event.
fn handle_history_item(item: HistoryItem, dispatcher: &EventDispatcher, audio: &AudioStore) {
    if !item.is_assistant_message() {
        return;
    }

    let text = item
        .content
        .iter()
        .filter_map(|part| match part {
            ContentPart::OutputText { text } => Some(text.trim()),
            _ => None,
        })
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if !text.is_empty() {
        dispatcher.emit(&ClientEvent::Message(MessagePayload {
            id: item.item_id.clone(),
            role: MessageRole::Assistant,
            text,
            source: MessageSource::Assistant,
        }));
    }

    for part in &item.content {
        let ContentPart::OutputAudio {
            audio: Some(encoded),
            transcript,
        } = part
        else {
            continue;
        };

        use base64::prelude::*;
        match BASE64_STANDARD.decode(encoded) {
            Ok(decoded) => {
                let clip = audio.insert(decoded.into());
                dispatcher.emit(&ClientEvent::Audio(AudioPayload {
                    id: item.item_id.clone(),
                    audio: clip,
                    transcript: transcript.clone(),
                    origin: AudioOrigin::History,
                }));
            }
            Err(e) => {
                warn!(item_id = %item.item_id, "Skipping undecodable history audio: {e}");
            }
        }
    }
}

/// Pull the client secret out of the provider payload, wherever it nests.
fn extract_client_secret(payload: &serde_json::Value) -> Option<String> {
    const PATHS: [&[&str]; 3] = [
        &["value"],
        &["client_secret", "value"],
        &["session", "client_secret", "value"],
    ];

    PATHS.iter().find_map(|path| {
        let mut current = payload;
        for key in *path {
            current = current.get(key)?;
        }
        current.as_str().map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RealtimeClientOptions::default();
        assert_eq!(options.endpoint, "/api/session");
        assert_eq!(options.model, "gpt-realtime-mini");
        assert_eq!(options.agent_name, "Realtime Demo Agent");
        assert!(!options.instructions.is_empty());
    }

    #[test]
    fn test_credential_url_joins_relative_endpoint() {
        let client = RealtimeClient::new(RealtimeClientOptions {
            server_url: "http://localhost:9000/".to_string(),
            ..Default::default()
        });
        assert_eq!(client.credential_url(), "http://localhost:9000/api/session");
    }

    #[test]
    fn test_credential_url_inserts_missing_slash() {
        let client = RealtimeClient::new(RealtimeClientOptions {
            server_url: "http://localhost:9000".to_string(),
            endpoint: "api/session".to_string(),
            ..Default::default()
        });
        assert_eq!(client.credential_url(), "http://localhost:9000/api/session");
    }

    #[test]
    fn test_credential_url_absolute_endpoint_wins() {
        let client = RealtimeClient::new(RealtimeClientOptions {
            endpoint: "https://gateway.example.com/api/session".to_string(),
            ..Default::default()
        });
        assert_eq!(
            client.credential_url(),
            "https://gateway.example.com/api/session"
        );
    }

    #[test]
    fn test_extract_client_secret_nestings() {
        let top = json!({ "value": "ek_top" });
        assert_eq!(extract_client_secret(&top).as_deref(), Some("ek_top"));

        let nested = json!({ "client_secret": { "value": "ek_nested" } });
        assert_eq!(extract_client_secret(&nested).as_deref(), Some("ek_nested"));

        let deep = json!({ "session": { "client_secret": { "value": "ek_deep" } } });
        assert_eq!(extract_client_secret(&deep).as_deref(), Some("ek_deep"));

        let missing = json!({ "client_secret": {} });
        assert!(extract_client_secret(&missing).is_none());

        let wrong_type = json!({ "value": 42 });
        assert!(extract_client_secret(&wrong_type).is_none());
    }

    #[test]
    fn test_initial_state() {
        let client = RealtimeClient::new(RealtimeClientOptions::default());
        assert_eq!(client.connection_status(), ConnectionStatus::Disconnected);
        assert!(!client.is_connected());
        assert_eq!(client.mic_state(), None);
        assert!(client.audio_store().is_empty());
    }
}
