pub mod conversation;
pub mod gateway;
pub mod llm_client;
pub mod orchestrator;
pub mod prompt;
pub mod provider;
pub mod registry;
pub mod topic;

use topic::{Topic, TopicProgress};

/// Where a session stands, as reported to the client with every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionStatus {
    pub current_topic: Topic,
    pub session_duration_secs: u64,
}

impl From<&TopicProgress> for SessionStatus {
    fn from(progress: &TopicProgress) -> Self {
        Self {
            current_topic: progress.current_topic(),
            session_duration_secs: progress.duration_secs(),
        }
    }
}

/// Represents events the core emits towards the connected client.
///
/// This enum is the primary API for decoupling the conversation logic from the
/// transport that delivers it (e.g. a WebSocket).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The user's message was accepted and a reply is being generated.
    ProcessingStart,
    /// The assistant's reply, with the session's updated status.
    Response { text: String, status: SessionStatus },
    /// A generic, user-facing error.
    Error { message: String },
}
