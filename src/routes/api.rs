//! API route configuration.

use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::session;
use crate::state::AppState;
use std::sync::Arc;

/// Create the API router.
///
/// # Endpoints
///
/// `POST /api/session` - mint an ephemeral realtime client secret
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session", post(session::create_session))
        .layer(TraceLayer::new_for_http())
}
