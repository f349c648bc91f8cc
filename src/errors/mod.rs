//! Error types for the gateway.
//!
//! Split by surface: `app_error` covers the HTTP server (credential issuer),
//! `client_error` covers the native realtime client library.

pub mod app_error;
pub mod client_error;

pub use app_error::{AppError, AppResult};
pub use client_error::{ClientError, ClientResult};
