mod config;
mod document;
mod errors;
mod gateway;
mod routes;
mod state;
mod templates;
mod wizard;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::gateway::{DocumentGateway, HttpGateway, InMemoryGateway};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Studio v{}", env!("CARGO_PKG_VERSION"));

    let gateway = build_gateway(&config)?;
    info!("Document gateway initialized ({})", gateway.backend());

    let state = AppState::new(config.clone(), gateway);
    state.sessions.spawn_sweeper(config.session_sweep_interval());
    info!(
        "Idle editing sessions expire after {}s",
        config.session_idle_timeout.as_secs()
    );

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// HTTP gateway when `BACKEND_URL` is set, otherwise a process-local store.
fn build_gateway(config: &Config) -> Result<Arc<dyn DocumentGateway>> {
    match config.backend_url.as_deref() {
        Some(url) => {
            if config.backend_token.is_none() {
                warn!("BACKEND_TOKEN is not set; every backend call will be refused");
            }
            let gateway = HttpGateway::new(
                url,
                config.backend_token.clone(),
                config.backend_timeout,
            )?;
            info!("Using document backend at {url}");
            Ok(Arc::new(gateway))
        }
        None => {
            warn!("BACKEND_URL is not set; documents are kept in memory and lost on restart");
            Ok(Arc::new(InMemoryGateway::new()))
        }
    }
}
