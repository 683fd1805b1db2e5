mod config;
mod cv_client;
mod errors;
mod registration;
mod routes;
mod state;
mod wizard;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::cv_client::HttpCvExtractor;
use crate::registration::HttpRegistrar;
use crate::routes::build_router;
use crate::state::AppState;
use crate::wizard::session::WizardSessions;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Recruit API v{}", env!("CARGO_PKG_VERSION"));

    let timeout = Duration::from_secs(config.http_timeout_secs);

    // CV extraction service
    let extractor = Arc::new(HttpCvExtractor::new(
        config.cv_extraction_url.clone(),
        timeout,
    )?);
    info!("CV extraction client initialized ({})", config.cv_extraction_url);

    // Registration service
    let registrar = Arc::new(HttpRegistrar::new(config.registration_url.clone(), timeout)?);
    info!("Registration client initialized ({})", config.registration_url);

    // Build app state
    let state = AppState {
        sessions: WizardSessions::default(),
        extractor,
        registrar,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
