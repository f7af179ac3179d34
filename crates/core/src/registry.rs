//! Session Registry
//!
//! Maps each live connection to its conversation state. Entries are inserted
//! on connect and removed on disconnect; every inbound event looks its state
//! up here. Each entry sits behind its own async mutex, which serializes the
//! exchanges of one connection without blocking any other connection.

use crate::{
    conversation::{ConnectionId, ConversationSession},
    prompt::compiled_prompt,
    topic::TopicProgress,
};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything one connection owns.
#[derive(Debug)]
pub struct SessionState {
    pub conversation: ConversationSession,
    pub progress: TopicProgress,
}

impl SessionState {
    /// History seeded with the full system prompt, progress at the first topic.
    pub fn new(id: ConnectionId) -> Self {
        Self {
            conversation: ConversationSession::new(id, compiled_prompt()),
            progress: TopicProgress::new(),
        }
    }
}

pub type SessionHandle = Arc<Mutex<SessionState>>;

#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `state` under `id`, replacing any previous entry.
    pub fn create(&self, id: ConnectionId, state: SessionState) -> SessionHandle {
        let handle = Arc::new(Mutex::new(state));
        self.sessions.insert(id, handle.clone());
        handle
    }

    pub fn get(&self, id: ConnectionId) -> Option<SessionHandle> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Removes the entry for `id`. Returns whether one existed.
    pub fn delete(&self, id: ConnectionId) -> bool {
        self.sessions.remove(&id).is_some()
    }

    /// Whether `handle` is still the state registered for `id`.
    ///
    /// False once the connection was closed, even if a new session has since
    /// been registered under the same id.
    pub fn is_current(&self, id: ConnectionId, handle: &SessionHandle) -> bool {
        self.sessions
            .get(&id)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), handle))
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
