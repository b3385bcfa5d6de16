//! Process-wide table of live sessions.
//!
//! The registry is the only mutable structure shared across connections.
//! Each session's internal state is touched only by the connection handler
//! that owns it; the registry itself just maps connection identity to the
//! session handle.

use crate::session::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Concurrency-safe session table keyed by connection identity.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Registers a session under its connection identity, replacing any
    /// previous session for the same connection.
    pub async fn create(&self, session: Session) -> Arc<Mutex<Session>> {
        let id = session.id().to_string();
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, Arc::clone(&handle));
        handle
    }

    /// Looks up a session by connection identity.
    pub async fn lookup(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.read().await.get(id).cloned()
    }

    /// Removes and returns the session for a connection, if any.
    pub async fn remove(&self, id: &str) -> Option<Arc<Mutex<Session>>> {
        self.sessions.write().await.remove(id)
    }

    /// Number of live sessions.
    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Returns true if no sessions are registered.
    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
