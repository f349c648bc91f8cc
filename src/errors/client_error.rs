//! Client-side error type for the native realtime client.

use thiserror::Error;

/// Errors surfaced by [`crate::core::client::RealtimeClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// The credential endpoint returned a non-2xx status
    #[error("Credential request failed: {status} {body}")]
    Network {
        /// HTTP status code from the credential endpoint
        status: u16,
        /// Response body text, best effort
        body: String,
    },

    /// The credential fetch itself failed (DNS, refused connection, ...)
    #[error("Credential request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The credential payload did not contain a client secret value
    #[error("Credential payload invalid: {0}")]
    Credential(String),

    /// The operation requires a connected session but none exists.
    /// This is a programming-contract violation, thrown rather than emitted.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The underlying session or transport reported a failure
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type for realtime client operations.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_includes_status_and_body() {
        let err = ClientError::Network {
            status: 500,
            body: "{\"error\":\"boom\"}".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("500"));
        assert!(text.contains("boom"));
    }

    #[test]
    fn test_invalid_state_display() {
        let err = ClientError::InvalidState("no session".into());
        assert!(err.to_string().contains("no session"));
    }
}
