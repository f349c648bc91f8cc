//! Credential issuer: mints short-lived OpenAI Realtime client secrets.
//!
//! `POST /api/session` accepts an optional `{ "model": string }` body and
//! returns the provider's client-secret payload verbatim, so the browser
//! client can read the secret from whichever nesting the provider uses.
//!
//! The minted session is fixed to audio output with server-driven voice
//! activity detection (threshold 0.5, 300ms prefix padding, 500ms silence
//! timeout) and the `marin` voice.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;

/// Voice used for all minted sessions.
const SESSION_VOICE: &str = "marin";

/// Request body for the session endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SessionRequest {
    /// Realtime model to mint a session for; falls back to the configured
    /// default when absent or blank.
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClientSecretRequest {
    session: SessionDescriptor,
}

#[derive(Debug, Serialize)]
struct SessionDescriptor {
    #[serde(rename = "type")]
    session_type: &'static str,
    model: String,
    output_modalities: Vec<&'static str>,
    audio: AudioConfig,
}

#[derive(Debug, Serialize)]
struct AudioConfig {
    input: AudioInputConfig,
    output: AudioOutputConfig,
}

#[derive(Debug, Serialize)]
struct AudioInputConfig {
    turn_detection: TurnDetection,
}

#[derive(Debug, Serialize)]
struct TurnDetection {
    #[serde(rename = "type")]
    detection_type: &'static str,
    threshold: f32,
    prefix_padding_ms: u32,
    silence_duration_ms: u32,
}

#[derive(Debug, Serialize)]
struct AudioOutputConfig {
    voice: &'static str,
}

impl ClientSecretRequest {
    fn new(model: String) -> Self {
        Self {
            session: SessionDescriptor {
                session_type: "realtime",
                model,
                output_modalities: vec!["audio"],
                audio: AudioConfig {
                    input: AudioInputConfig {
                        turn_detection: TurnDetection {
                            detection_type: "server_vad",
                            threshold: 0.5,
                            prefix_padding_ms: 300,
                            silence_duration_ms: 500,
                        },
                    },
                    output: AudioOutputConfig {
                        voice: SESSION_VOICE,
                    },
                },
            },
        }
    }
}

/// Mint an ephemeral realtime client secret.
///
/// A malformed or missing body is treated as an empty request. Responds 500
/// with `{ "error": ... }` when no API key is configured (no outbound call is
/// attempted) and `{ "error": ..., "detail": ... }` on provider failure.
pub async fn create_session(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> AppResult<Json<serde_json::Value>> {
    let Some(api_key) = state.config.openai_api_key.as_deref() else {
        return Err(AppError::Configuration(
            "OPENAI_API_KEY is not configured".to_string(),
        ));
    };

    // Raw bytes, not a Json extractor: an unreadable body must fall back to
    // the default model instead of rejecting the request
    let request = serde_json::from_slice::<SessionRequest>(&body).unwrap_or_default();
    let model = request
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(&state.config.realtime_model)
        .to_string();

    info!(model = %model, "Minting realtime client secret");

    let url = format!("{}/realtime/client_secrets", state.config.openai_base_url);
    let response = state
        .http
        .post(&url)
        .bearer_auth(api_key)
        .json(&ClientSecretRequest::new(model))
        .send()
        .await
        .map_err(|e| {
            error!("Realtime client secret request failed: {e}");
            AppError::Provider(e.to_string())
        })?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(status = %status, "Provider rejected client secret request: {body}");
        return Err(AppError::Provider(format!("{status}: {body}")));
    }

    let payload = response.json::<serde_json::Value>().await.map_err(|e| {
        error!("Provider returned unreadable client secret payload: {e}");
        AppError::Provider(e.to_string())
    })?;

    Ok(Json(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_secret_request_shape() {
        let request = ClientSecretRequest::new("gpt-realtime-mini".to_string());
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["session"]["type"], "realtime");
        assert_eq!(value["session"]["model"], "gpt-realtime-mini");
        assert_eq!(value["session"]["output_modalities"][0], "audio");

        let vad = &value["session"]["audio"]["input"]["turn_detection"];
        assert_eq!(vad["type"], "server_vad");
        assert_eq!(vad["threshold"], 0.5);
        assert_eq!(vad["prefix_padding_ms"], 300);
        assert_eq!(vad["silence_duration_ms"], 500);

        assert_eq!(value["session"]["audio"]["output"]["voice"], "marin");
    }

    #[test]
    fn test_session_request_tolerates_empty_body() {
        let request: SessionRequest = serde_json::from_str("{}").unwrap();
        assert!(request.model.is_none());

        let request: SessionRequest =
            serde_json::from_str("{\"model\": \"gpt-realtime\"}").unwrap();
        assert_eq!(request.model.as_deref(), Some("gpt-realtime"));
    }
}
