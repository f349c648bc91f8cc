//! Configuration module for the Parley Gateway server
//!
//! Configuration is loaded from environment variables (with `.env` support via
//! `dotenvy`, loaded in `main` before this module runs). The OpenAI API key is
//! intentionally optional at startup: the credential issuer reports a missing
//! key per request instead of refusing to boot, so the demo UI can surface the
//! problem.
//!
//! # Example
//! ```rust,no_run
//! use parley_gateway::config::ServerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::env;

/// Default realtime model used when neither the request nor the environment
/// specifies one.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-realtime-mini";

/// Default OpenAI REST base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Server configuration
///
/// Contains everything needed to run the gateway:
/// - Bind address (host, port)
/// - OpenAI credentials and base URL for minting client secrets
/// - Default realtime model
/// - CORS origins for the browser demo
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 0.0.0.0)
    pub host: String,
    /// Port to bind to (default: 8080)
    pub port: u16,
    /// OpenAI API key used to mint ephemeral client secrets.
    /// Absence is reported by the session endpoint, not at startup.
    pub openai_api_key: Option<String>,
    /// Default realtime model for minted sessions
    pub realtime_model: String,
    /// OpenAI REST base URL (overridable for testing against a mock)
    pub openai_base_url: String,
    /// Comma-separated CORS origins, or "*" for any (default: none)
    pub cors_allowed_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            openai_api_key: None,
            realtime_model: DEFAULT_REALTIME_MODEL.to_string(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Recognized variables: `HOST`, `PORT`, `OPENAI_API_KEY`,
    /// `REALTIME_MODEL`, `OPENAI_BASE_URL`, `CORS_ALLOWED_ORIGINS`.
    pub fn from_env() -> Result<Self, String> {
        let defaults = Self::default();

        let port = match env::var("PORT") {
            Ok(raw) => raw
                .parse::<u16>()
                .map_err(|_| format!("PORT must be a number between 1 and 65535, got '{raw}'"))?,
            Err(_) => defaults.port,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port,
            openai_api_key: non_empty(env::var("OPENAI_API_KEY").ok()),
            realtime_model: non_empty(env::var("REALTIME_MODEL").ok())
                .unwrap_or(defaults.realtime_model),
            openai_base_url: non_empty(env::var("OPENAI_BASE_URL").ok())
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(defaults.openai_base_url),
            cors_allowed_origins: non_empty(env::var("CORS_ALLOWED_ORIGINS").ok()),
        })
    }

    /// The socket address string this server binds to.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        for key in [
            "HOST",
            "PORT",
            "OPENAI_API_KEY",
            "REALTIME_MODEL",
            "OPENAI_BASE_URL",
            "CORS_ALLOWED_ORIGINS",
        ] {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.realtime_model, DEFAULT_REALTIME_MODEL);
        assert_eq!(config.openai_base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        clear_env();
        unsafe {
            env::set_var("HOST", "127.0.0.1");
            env::set_var("PORT", "9001");
            env::set_var("OPENAI_API_KEY", "sk-test");
            env::set_var("REALTIME_MODEL", "gpt-realtime");
            env::set_var("OPENAI_BASE_URL", "http://localhost:1234/v1/");
        }
        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9001);
        assert_eq!(config.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.realtime_model, "gpt-realtime");
        // Trailing slash is stripped so URL joining stays predictable
        assert_eq!(config.openai_base_url, "http://localhost:1234/v1");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_rejected() {
        clear_env();
        unsafe { env::set_var("PORT", "not-a-port") };
        let result = ServerConfig::from_env();
        assert!(result.is_err());
        clear_env();
    }

    #[test]
    #[serial]
    fn test_empty_key_treated_as_missing() {
        clear_env();
        unsafe { env::set_var("OPENAI_API_KEY", "   ") };
        let config = ServerConfig::from_env().unwrap();
        assert!(config.openai_api_key.is_none());
        clear_env();
    }
}
