use std::sync::Arc;

use crate::config::Config;
use crate::gateway::DocumentGateway;
use crate::wizard::SessionStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// HTTP backend or in-memory store, picked from `BACKEND_URL` at startup.
    pub gateway: Arc<dyn DocumentGateway>,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: Config, gateway: Arc<dyn DocumentGateway>) -> Self {
        let sessions = SessionStore::new(config.session_idle_timeout);
        Self {
            config,
            gateway,
            sessions,
        }
    }
}
