//! Session Orchestrator
//!
//! Drives one conversation per connection. Inbound speech and topic-change
//! requests update the connection's history and topic progress, go through the
//! LLM gateway, and produce `SessionEvent`s for the transport to deliver.
//!
//! The per-session lock is held for a whole exchange, so a second event for the
//! same connection waits for the first to finish. A disconnect removes the
//! session immediately; an exchange still waiting on the LLM notices this when
//! the reply arrives and drops it.

use crate::{
    SessionEvent, SessionStatus,
    conversation::{ConnectionId, ConversationError, ConversationMessage},
    gateway::{GatewayReply, LLMGateway},
    registry::{SessionHandle, SessionRegistry, SessionState},
    topic::{Topic, humanize},
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, instrument, warn};

pub const SPEECH_ERROR_MESSAGE: &str = "Error processing your request. Please try again.";
pub const TOPIC_CHANGE_ERROR_MESSAGE: &str =
    "Error changing the discussion topic. Please try again.";

const LOG_PREVIEW_CHARS: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Conversation(#[from] ConversationError),
}

pub struct SessionOrchestrator {
    registry: SessionRegistry,
    gateway: LLMGateway,
}

impl SessionOrchestrator {
    pub fn new(gateway: LLMGateway) -> Self {
        Self {
            registry: SessionRegistry::new(),
            gateway,
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Opens a fresh conversation for a new connection.
    pub fn connect(&self, connection_id: ConnectionId) {
        self.registry
            .create(connection_id, SessionState::new(connection_id));
        info!(%connection_id, "New client connected");
    }

    /// Tears down the connection's state. Replies still in flight are dropped
    /// when they arrive.
    pub fn disconnect(&self, connection_id: ConnectionId) {
        if self.registry.delete(connection_id) {
            info!(%connection_id, "Client disconnected");
        } else {
            debug!(%connection_id, "Disconnect for a connection with no session");
        }
    }

    /// Runs one normal question/answer round.
    #[instrument(name = "speech", skip_all, fields(%connection_id))]
    pub async fn handle_speech(
        &self,
        connection_id: ConnectionId,
        text: &str,
        events: &mpsc::Sender<SessionEvent>,
    ) {
        let Some(handle) = self.registry.get(connection_id) else {
            warn!("Ignoring speech for a connection with no session");
            return;
        };
        let mut state = handle.lock().await;
        info!(user_message = %text, "Received speech");

        match self
            .speech_exchange(connection_id, &handle, &mut state, text, events)
            .await
        {
            Ok(Some(event)) => send_event(events, event).await,
            Ok(None) => info!("Connection closed while waiting for the LLM; reply discarded"),
            Err(e) => {
                error!(error = %e, "Error processing speech");
                send_event(
                    events,
                    SessionEvent::Error {
                        message: SPEECH_ERROR_MESSAGE.to_string(),
                    },
                )
                .await;
            }
        }
    }

    async fn speech_exchange(
        &self,
        connection_id: ConnectionId,
        handle: &SessionHandle,
        state: &mut SessionState,
        text: &str,
        events: &mpsc::Sender<SessionEvent>,
    ) -> Result<Option<SessionEvent>, OrchestratorError> {
        state.conversation.append(ConversationMessage::user(text))?;
        send_event(events, SessionEvent::ProcessingStart).await;

        let reply = self
            .gateway
            .generate_response(state.conversation.snapshot(), None)
            .await;
        if !self.registry.is_current(connection_id, handle) {
            return Ok(None);
        }
        log_reply(&reply);

        state
            .conversation
            .append(ConversationMessage::assistant(reply.text()))?;
        state.progress.record_round();
        if state.progress.should_advance(text) && state.progress.advance() {
            info!(topic = %state.progress.current_topic(), "Advancing to next topic");
        }

        Ok(Some(SessionEvent::Response {
            text: reply.into_text(),
            status: SessionStatus::from(&state.progress),
        }))
    }

    /// Moves the conversation to `topic` on the user's request and asks the
    /// LLM to open it.
    ///
    /// Unknown topics leave the progress untouched and use the full prompt.
    #[instrument(name = "change_topic", skip_all, fields(%connection_id, %topic))]
    pub async fn handle_topic_change(
        &self,
        connection_id: ConnectionId,
        topic: &str,
        events: &mpsc::Sender<SessionEvent>,
    ) {
        let Some(handle) = self.registry.get(connection_id) else {
            warn!("Ignoring topic change for a connection with no session");
            return;
        };
        let mut state = handle.lock().await;

        match self
            .topic_change_exchange(connection_id, &handle, &mut state, topic)
            .await
        {
            Ok(Some(event)) => send_event(events, event).await,
            Ok(None) => info!("Connection closed while waiting for the LLM; reply discarded"),
            Err(e) => {
                error!(error = %e, "Error changing topic");
                send_event(
                    events,
                    SessionEvent::Error {
                        message: TOPIC_CHANGE_ERROR_MESSAGE.to_string(),
                    },
                )
                .await;
            }
        }
    }

    async fn topic_change_exchange(
        &self,
        connection_id: ConnectionId,
        handle: &SessionHandle,
        state: &mut SessionState,
        topic: &str,
    ) -> Result<Option<SessionEvent>, OrchestratorError> {
        let requested = match topic.parse::<Topic>() {
            Ok(requested) => {
                state.progress.jump_to(requested);
                info!("Switched topic on request");
                Some(requested)
            }
            Err(e) => {
                state.progress.reset_rounds();
                warn!(error = %e, "Keeping current topic; no prompt override");
                None
            }
        };

        state.conversation.append(ConversationMessage::user(format!(
            "Let's move on to discuss {}",
            humanize(topic)
        )))?;

        let section = requested.map(Topic::prompt_section);
        let reply = self
            .gateway
            .generate_response(state.conversation.snapshot(), section)
            .await;
        if !self.registry.is_current(connection_id, handle) {
            return Ok(None);
        }
        log_reply(&reply);

        state
            .conversation
            .append(ConversationMessage::assistant(reply.text()))?;
        state.progress.refresh_duration();

        Ok(Some(SessionEvent::Response {
            text: reply.into_text(),
            status: SessionStatus::from(&state.progress),
        }))
    }
}

async fn send_event(events: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    if events.send(event).await.is_err() {
        warn!("Event receiver dropped; client will not see this event");
    }
}

fn log_reply(reply: &GatewayReply) {
    let text = reply.text();
    let mut preview: String = text.chars().take(LOG_PREVIEW_CHARS).collect();
    if text.chars().count() > LOG_PREVIEW_CHARS {
        preview.push_str("...");
    }
    if reply.is_fallback() {
        warn!(response = %preview, "Responding with fallback reply");
    } else {
        info!(response = %preview, "Responding");
    }
}
