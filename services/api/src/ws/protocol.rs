//! Defines the WebSocket message protocol between the browser client and the API server.

use serde::{Deserialize, Serialize};
use yovo_core::{SessionEvent, SessionStatus, topic::Topic};

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// A transcribed user utterance.
    #[serde(rename = "speech")]
    Speech { text: String },
    /// Jumps the conversation to another topic. Unrecognized names are
    /// still announced to the assistant.
    #[serde(rename = "change-topic")]
    ChangeTopic { topic: String },
}

/// The session status attached to every assistant reply.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub current_topic: Topic,
    /// Whole seconds since the session started.
    pub session_duration: u64,
}

impl From<SessionStatus> for SessionState {
    fn from(status: SessionStatus) -> Self {
        Self {
            current_topic: status.current_topic,
            session_duration: status.session_duration_secs,
        }
    }
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// The utterance was accepted and a reply is being generated.
    ProcessingStart,
    /// The assistant's reply.
    LlmResponse {
        text: String,
        #[serde(rename = "sessionState")]
        session_state: SessionState,
    },
    /// A user-facing error.
    Error { message: String },
}

impl From<SessionEvent> for ServerMessage {
    fn from(event: SessionEvent) -> Self {
        match event {
            SessionEvent::ProcessingStart => ServerMessage::ProcessingStart,
            SessionEvent::Response { text, status } => ServerMessage::LlmResponse {
                text,
                session_state: status.into(),
            },
            SessionEvent::Error { message } => ServerMessage::Error { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_client_message_deserialization() {
        let speech: ClientMessage =
            serde_json::from_str(r#"{"type": "speech", "text": "I love biology"}"#).unwrap();
        assert_eq!(
            speech,
            ClientMessage::Speech {
                text: "I love biology".to_string()
            }
        );

        let change: ClientMessage =
            serde_json::from_str(r#"{"type": "change-topic", "topic": "career-path"}"#).unwrap();
        assert_eq!(
            change,
            ClientMessage::ChangeTopic {
                topic: "career-path".to_string()
            }
        );
    }

    #[test]
    fn test_client_message_rejects_unknown_or_incomplete_frames() {
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "dance"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"type": "speech"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>(r#"{"text": "no type"}"#).is_err());
        assert!(serde_json::from_str::<ClientMessage>("not json").is_err());
    }

    #[test]
    fn test_processing_start_serialization() {
        let json = serde_json::to_string(&ServerMessage::ProcessingStart).unwrap();
        assert_eq!(json, r#"{"type":"processingStart"}"#);
    }

    #[test]
    fn test_llm_response_serialization() {
        let msg = ServerMessage::from(SessionEvent::Response {
            text: "What do you enjoy most?".to_string(),
            status: SessionStatus {
                current_topic: Topic::MajorExploration,
                session_duration_secs: 42,
            },
        });

        let value: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "llmResponse",
                "text": "What do you enjoy most?",
                "sessionState": {
                    "currentTopic": "major-exploration",
                    "sessionDuration": 42
                }
            })
        );
    }

    #[test]
    fn test_error_serialization() {
        let msg = ServerMessage::from(SessionEvent::Error {
            message: "Error processing your request. Please try again.".to_string(),
        });
        let value: Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "error",
                "message": "Error processing your request. Please try again."
            })
        );
    }
}
