//! Per-connection WebSocket handler.
//!
//! One task per connection: binary frames are audio, text frames are control
//! commands. The session lock is held across each message, which serializes
//! append, scheduler decision, and recognition per session while other
//! connections proceed in parallel.

use crate::server::AppState;
use crate::server::protocol::{ClientCommand, ServerEvent};
use crate::session::session::{Session, SessionState};
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Upgrades an HTTP request to a WebSocket connection.
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Drives one client connection until it closes.
pub async fn handle_socket(socket: WebSocket, state: AppState) {
    let conn_id = Uuid::new_v4().to_string();
    info!(conn = %conn_id, "client connected");

    let (mut sender, mut receiver) = socket.split();

    let connected = ServerEvent::Connected {
        message: "connected to scribed speech-to-text service".to_string(),
        mode: state.mode,
    };
    if send_event(&mut sender, &connected).await.is_err() {
        return;
    }

    let mut session = state.registry.create(state.new_session(&conn_id)).await;

    while let Some(Ok(message)) = receiver.next().await {
        let events = match message {
            Message::Binary(bytes) => {
                let mut guard = session.lock().await;
                if guard.state() == SessionState::Closed {
                    // No events after session end; late audio is dropped.
                    debug!(conn = %conn_id, "dropping audio after session end");
                    Vec::new()
                } else {
                    guard.handle_audio(&bytes).await
                }
            }
            Message::Text(text) => {
                handle_command(&text, &mut session, &state, &conn_id).await
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => Vec::new(),
        };

        let mut send_failed = false;
        for event in &events {
            if send_event(&mut sender, event).await.is_err() {
                send_failed = true;
                break;
            }
        }
        if send_failed {
            break;
        }
    }

    // Abrupt disconnect or clean close: release the session without emitting
    // further events. Unflushed audio is discarded.
    if let Some(session) = state.registry.remove(&conn_id).await {
        session.lock().await.abort();
    }
    info!(conn = %conn_id, "client disconnected");
}

async fn handle_command(
    text: &str,
    session: &mut Arc<Mutex<Session>>,
    state: &AppState,
    conn_id: &str,
) -> Vec<ServerEvent> {
    match ClientCommand::from_json(text.trim()) {
        Ok(ClientCommand::Start) => {
            // A connection may run sessions back to back; a start after the
            // previous session closed gets a fresh one.
            if session.lock().await.state() == SessionState::Closed {
                *session = state.registry.create(state.new_session(conn_id)).await;
            }
            vec![session.lock().await.handle_start()]
        }
        Ok(ClientCommand::Stop) => session.lock().await.handle_stop().await,
        Ok(ClientCommand::Ping) => vec![ServerEvent::Pong],
        Err(e) => {
            warn!(conn = %conn_id, error = %e, "unparseable command");
            vec![ServerEvent::error(format!("unrecognized command: {}", e))]
        }
    }
}

async fn send_event(
    sender: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = event.to_json().map_err(axum::Error::new)?;
    sender.send(Message::Text(json)).await
}
