//! Connection Registry
//!
//! Tracks every live session by id so the health endpoint can report the count
//! and shutdown can tear down whatever is still connected.

use crate::ws::controller::SessionController;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

#[derive(Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<SessionController>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a session under its own id and returns that id.
    pub async fn register(&self, session: Arc<SessionController>) -> Uuid {
        let id = session.id();
        self.sessions.write().await.insert(id, session);
        id
    }

    /// Removes a session. Removing an absent id is a no-op.
    pub async fn remove(&self, id: Uuid) -> Option<Arc<SessionController>> {
        self.sessions.write().await.remove(&id)
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<SessionController>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Empties the registry, cleaning up every session. Used at shutdown.
    pub async fn drain(&self) -> usize {
        let sessions: Vec<_> = self.sessions.write().await.drain().collect();
        let drained = sessions.len();
        for (id, session) in sessions {
            session
                .cleanup()
                .instrument(info_span!("ws_session", session_id = %id))
                .await;
        }
        info!(drained, "Session registry drained");
        drained
    }
}
