//! Conversation History
//!
//! Each connected client owns one `ConversationSession`: the ordered list of
//! role-tagged messages that is replayed to the LLM on every turn. The first
//! message is always the system prompt, and the history is kept bounded by
//! dropping the oldest turns while preserving that system message.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Histories longer than this are truncated after an append.
pub const HISTORY_CAP: usize = 15;
/// Number of most recent messages kept behind the system message on truncation.
pub const RETAINED_TAIL: usize = 16;

/// Opaque identifier of one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConversationError {
    #[error("Refusing to append an empty {0} message")]
    EmptyContent(MessageRole),
}

/// The persisted message history of a single connection.
#[derive(Debug, Clone)]
pub struct ConversationSession {
    id: ConnectionId,
    messages: Vec<ConversationMessage>,
}

impl ConversationSession {
    /// Starts a history holding only the given system prompt.
    pub fn new(id: ConnectionId, system_prompt: impl Into<String>) -> Self {
        Self {
            id,
            messages: vec![ConversationMessage::system(system_prompt)],
        }
    }

    /// Rebuilds a session from an existing message sequence as-is.
    ///
    /// The caller guarantees the first message is the system message. No
    /// truncation is applied until the next `append` or `truncate`.
    pub fn from_messages(id: ConnectionId, messages: Vec<ConversationMessage>) -> Self {
        Self { id, messages }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
    }

    /// Appends a message, then truncates if the history grew past the cap.
    pub fn append(&mut self, message: ConversationMessage) -> Result<(), ConversationError> {
        if message.content.is_empty() {
            return Err(ConversationError::EmptyContent(message.role));
        }
        self.messages.push(message);
        self.truncate();
        Ok(())
    }

    /// Keeps the system message plus the most recent `RETAINED_TAIL` messages
    /// once the history exceeds `HISTORY_CAP`.
    pub fn truncate(&mut self) {
        let len = self.messages.len();
        if len <= HISTORY_CAP {
            return;
        }
        let tail_start = len.saturating_sub(RETAINED_TAIL).max(1);
        self.messages.drain(1..tail_start);
    }

    /// A copy of the history that callers may modify freely.
    pub fn snapshot(&self) -> Vec<ConversationMessage> {
        self.messages.clone()
    }
}
