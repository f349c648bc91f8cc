//! HTTP request handlers.

pub mod session;
