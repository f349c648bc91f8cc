use std::sync::Arc;

use anyhow::anyhow;
use axum::http::{Method, header::CONTENT_TYPE};
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use parley_gateway::{ServerConfig, routes, state::AppState};

/// Parley Gateway - realtime voice demo gateway
#[derive(Parser, Debug)]
#[command(name = "parley-gateway")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Host to bind to (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = ServerConfig::from_env().map_err(|e| anyhow!(e))?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    if config.openai_api_key.is_none() {
        tracing::warn!(
            "OPENAI_API_KEY is not set; /api/session will return configuration errors"
        );
    }

    let address = config.address();
    let cors_origins = config.cors_allowed_origins.clone();

    let app_state = Arc::new(AppState::new(config));

    let mut app = routes::api::create_api_router().with_state(app_state);

    // Configure CORS for the browser demo
    if let Some(ref origins) = cors_origins {
        let cors = if origins == "*" {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE])
        } else {
            let origins: Vec<_> = origins
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([CONTENT_TYPE])
        };
        app = app.layer(cors);
    }

    info!("Starting server on {address}");
    let listener = TcpListener::bind(&address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
