//! Shared application state for HTTP handlers.

use crate::config::ServerConfig;

/// Application state shared across request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Shared HTTP client for provider calls
    pub http: reqwest::Client,
}

impl AppState {
    /// Create a new application state from configuration.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}
