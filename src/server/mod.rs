//! WebSocket server: shared state, routing, and serving.

pub mod handler;
pub mod protocol;

use crate::config::Config;
use crate::defaults;
use crate::error::Result;
use crate::server::protocol::ServerMode;
use crate::session::registry::SessionRegistry;
use crate::session::session::{Session, SessionConfig};
use crate::stt::Transcriber;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::info;

/// Shared state handed to every connection handler.
///
/// The recognizer is a process-wide capability injected at construction; the
/// semaphore caps concurrent recognition passes across sessions.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub transcriber: Arc<dyn Transcriber>,
    pub limiter: Arc<Semaphore>,
    pub session_config: SessionConfig,
    pub mode: ServerMode,
}

impl AppState {
    /// Builds server state around an injected recognizer.
    pub fn new(transcriber: Arc<dyn Transcriber>, config: &Config) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
            transcriber,
            limiter: Arc::new(Semaphore::new(defaults::MAX_CONCURRENT_PASSES)),
            session_config: config.session_config(),
            mode: config.server.mode,
        }
    }

    /// Creates an idle session bound to a connection identity.
    pub fn new_session(&self, conn_id: &str) -> Session {
        Session::new(
            conn_id.to_string(),
            self.session_config.clone(),
            Arc::clone(&self.transcriber),
            Arc::clone(&self.limiter),
        )
    }
}

/// Builds the HTTP router: the WebSocket endpoint plus a health check.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(handler::ws_upgrade))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "model": state.transcriber.model_name(),
        "mode": state.mode.as_str(),
        "sessions": state.registry.len().await,
    }))
}

/// Binds the listener and serves until the process exits.
pub async fn serve(config: &Config, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::error::ScribedError::Server {
                message: format!("failed to bind {}: {}", addr, e),
            })?;

    info!(mode = state.mode.as_str(), model = state.transcriber.model_name(),
          "listening on ws://{}/ws", addr);

    axum::serve(listener, router(state)).await?;
    Ok(())
}
