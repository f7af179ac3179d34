use crate::conversation::{ConversationMessage, MessageRole};
use async_openai::{
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

/// Upper bound on the length of a spoken reply.
pub const MAX_RESPONSE_TOKENS: u32 = 350;
pub const TEMPERATURE: f32 = 0.7;

/// Failures while talking to a chat-completion endpoint.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Failed to build chat completion request: {0}")]
    Request(#[from] OpenAIError),
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Provider returned {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("Malformed completion payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Completion contained no message content")]
    EmptyResponse,
}

impl LlmError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            LlmError::Status { status, .. } => Some(*status),
            LlmError::Transport(e) => e.status(),
            _ => None,
        }
    }

    /// The raw provider payload, when one was received.
    pub fn payload(&self) -> Option<&str> {
        match self {
            LlmError::Status { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// A client able to run one chat completion against an OpenAI-compatible API.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Sends `request` once to `url` and returns the first choice's content.
    async fn create_chat_completion(
        &self,
        url: &str,
        api_key: &SecretString,
        request: CreateChatCompletionRequest,
    ) -> Result<String, LlmError>;
}

/// `LLMClient` over plain HTTP, for DeepSeek, OpenAI and any other service
/// speaking the same chat-completion protocol.
///
/// Each call is a single attempt; nothing is retried.
pub struct HttpLLMClient {
    http: reqwest::Client,
}

impl HttpLLMClient {
    pub fn new(timeout: Duration) -> Result<Self, LlmError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl LLMClient for HttpLLMClient {
    async fn create_chat_completion(
        &self,
        url: &str,
        api_key: &SecretString,
        request: CreateChatCompletionRequest,
    ) -> Result<String, LlmError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status { status, body });
        }
        extract_content(&body)
    }
}

#[derive(Deserialize)]
struct CompletionBody {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Pulls the first choice's message content out of a completion payload.
pub fn extract_content(body: &str) -> Result<String, LlmError> {
    let completion: CompletionBody = serde_json::from_str(body)?;
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(LlmError::EmptyResponse)
}

/// Builds the provider request for a conversation, with the fixed reply
/// length and sampling temperature.
#[allow(deprecated)]
pub fn build_request(
    model: &str,
    messages: &[ConversationMessage],
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let messages = messages
        .iter()
        .map(to_request_message)
        .collect::<Result<Vec<_>, _>>()?;

    CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages(messages)
        .max_tokens(MAX_RESPONSE_TOKENS)
        .temperature(TEMPERATURE)
        .build()
}

fn to_request_message(
    message: &ConversationMessage,
) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.clone();
    Ok(match message.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    })
}
