//! LLM Gateway
//!
//! Dispatches a conversation to the configured provider and guarantees an
//! answer: configuration problems and provider failures are turned into fixed
//! fallback replies rather than errors, so callers always have something to
//! say back to the user.

use crate::{
    conversation::{ConversationMessage, MessageRole},
    llm_client::{LLMClient, build_request},
    prompt::PromptSection,
    provider::LlmSettings,
};
use std::sync::Arc;
use tracing::{debug, error};

pub const MISSING_API_KEY_REPLY: &str = "Configuration Error: API key not set.";
pub const PROVIDER_FAILURE_REPLY: &str =
    "I apologize, but I'm having trouble connecting to my knowledge base right now. Please try again later.";

/// Why a fallback reply was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackKind {
    UnknownProvider(String),
    MissingApiKey,
    ProviderFailure,
}

impl FallbackKind {
    pub fn reply_text(&self) -> String {
        match self {
            FallbackKind::UnknownProvider(name) => {
                format!("Configuration Error: Unknown provider '{}'", name)
            }
            FallbackKind::MissingApiKey => MISSING_API_KEY_REPLY.to_string(),
            FallbackKind::ProviderFailure => PROVIDER_FAILURE_REPLY.to_string(),
        }
    }
}

/// The outcome of one `generate_response` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayReply {
    /// The provider's message content, unmodified.
    Completed(String),
    /// A locally produced reply standing in for the provider's.
    Fallback { kind: FallbackKind, text: String },
}

impl GatewayReply {
    fn fallback(kind: FallbackKind) -> Self {
        let text = kind.reply_text();
        GatewayReply::Fallback { kind, text }
    }

    pub fn text(&self) -> &str {
        match self {
            GatewayReply::Completed(text) => text,
            GatewayReply::Fallback { text, .. } => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            GatewayReply::Completed(text) => text,
            GatewayReply::Fallback { text, .. } => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GatewayReply::Fallback { .. })
    }
}

pub struct LLMGateway {
    settings: Arc<LlmSettings>,
    client: Arc<dyn LLMClient>,
}

impl LLMGateway {
    pub fn new(settings: impl Into<Arc<LlmSettings>>, client: Arc<dyn LLMClient>) -> Self {
        Self {
            settings: settings.into(),
            client,
        }
    }

    pub fn settings(&self) -> &LlmSettings {
        &self.settings
    }

    /// Asks the configured provider to continue `history`.
    ///
    /// `history` is the caller's copy; with a `section`, its system message is
    /// replaced by that section's text before sending. Exactly one request is
    /// made, and none at all when the provider is unknown or has no API key.
    pub async fn generate_response(
        &self,
        mut history: Vec<ConversationMessage>,
        section: Option<PromptSection>,
    ) -> GatewayReply {
        let provider = match self.settings.resolve_provider() {
            Ok(provider) => provider,
            Err(e) => {
                error!(error = %e, "Unknown LLM provider configured");
                return GatewayReply::fallback(FallbackKind::UnknownProvider(e.0));
            }
        };

        let endpoint = self.settings.endpoint(provider);
        let Some(api_key) = endpoint.api_key.as_ref() else {
            error!(%provider, "API key is not set for the configured provider");
            return GatewayReply::fallback(FallbackKind::MissingApiKey);
        };

        if let Some(section) = section {
            apply_section_override(&mut history, section);
        }

        debug!(
            %provider,
            message_count = history.len(),
            prompt_section = section.map(PromptSection::name).unwrap_or("full system prompt"),
            "Calling chat completion API"
        );

        let request = match build_request(&endpoint.model, &history) {
            Ok(request) => request,
            Err(e) => {
                error!(%provider, error = %e, "Failed to build chat completion request");
                return GatewayReply::fallback(FallbackKind::ProviderFailure);
            }
        };

        match self
            .client
            .create_chat_completion(&endpoint.completions_url(), api_key, request)
            .await
        {
            Ok(text) => GatewayReply::Completed(text),
            Err(e) => {
                error!(
                    %provider,
                    error = %e,
                    status = ?e.status(),
                    payload = e.payload().unwrap_or_default(),
                    "Error calling chat completion API"
                );
                GatewayReply::fallback(FallbackKind::ProviderFailure)
            }
        }
    }
}

/// Puts `section` in place of the system message, inserting one at the front
/// when the history has none.
fn apply_section_override(history: &mut Vec<ConversationMessage>, section: PromptSection) {
    match history.iter_mut().find(|m| m.role == MessageRole::System) {
        Some(system) => system.content = section.text().to_string(),
        None => history.insert(0, ConversationMessage::system(section.text())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        llm_client::{LlmError, MockLLMClient},
        prompt::compiled_prompt,
        provider::ProviderSettings,
    };
    use reqwest::StatusCode;
    use secrecy::{ExposeSecret, SecretString};
    use serde_json::Value;

    fn settings(provider: &str, api_key: Option<&str>) -> LlmSettings {
        let key = api_key.map(|k| SecretString::from(k.to_string()));
        LlmSettings {
            provider: provider.to_string(),
            deepseek: ProviderSettings::deepseek_defaults(None),
            openai: ProviderSettings::openai_defaults(key),
            ..LlmSettings::default()
        }
    }

    fn history() -> Vec<ConversationMessage> {
        vec![
            ConversationMessage::system(compiled_prompt()),
            ConversationMessage::user("I like drawing and math"),
        ]
    }

    fn request_json(request: &async_openai::types::CreateChatCompletionRequest) -> Value {
        serde_json::to_value(request).unwrap()
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_fast_without_network_call() {
        let mut client = MockLLMClient::new();
        client.expect_create_chat_completion().never();
        let gateway = LLMGateway::new(settings("openai", None), Arc::new(client));

        let reply = gateway.generate_response(history(), None).await;

        assert_eq!(
            reply,
            GatewayReply::Fallback {
                kind: FallbackKind::MissingApiKey,
                text: "Configuration Error: API key not set.".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_provider_fails_fast_without_network_call() {
        let mut client = MockLLMClient::new();
        client.expect_create_chat_completion().never();
        let gateway = LLMGateway::new(settings("anthropic", Some("sk-test")), Arc::new(client));

        let reply = gateway.generate_response(history(), None).await;

        assert!(reply.is_fallback());
        assert_eq!(
            reply.text(),
            "Configuration Error: Unknown provider 'anthropic'"
        );
    }

    #[tokio::test]
    async fn test_successful_completion_is_returned_unmodified() {
        let mut client = MockLLMClient::new();
        client
            .expect_create_chat_completion()
            .times(1)
            .withf(|url, key, request| {
                let json = request_json(request);
                url == "https://api.openai.com/v1/chat/completions"
                    && key.expose_secret() == "sk-test"
                    && json["model"] == "gpt-3.5-turbo"
                    && json["messages"][0]["content"] == compiled_prompt()
            })
            .returning(|_, _, _| Ok("  What kind of math do you enjoy?  ".to_string()));
        let gateway = LLMGateway::new(settings("OpenAI", Some("sk-test")), Arc::new(client));

        let reply = gateway.generate_response(history(), None).await;

        assert_eq!(
            reply,
            GatewayReply::Completed("  What kind of math do you enjoy?  ".to_string())
        );
    }

    #[tokio::test]
    async fn test_provider_error_becomes_apology_after_single_attempt() {
        let mut client = MockLLMClient::new();
        client
            .expect_create_chat_completion()
            .times(1)
            .returning(|_, _, _| {
                Err(LlmError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    body: "upstream exploded".to_string(),
                })
            });
        let gateway = LLMGateway::new(settings("openai", Some("sk-test")), Arc::new(client));

        let reply = gateway.generate_response(history(), None).await;

        assert_eq!(
            reply,
            GatewayReply::Fallback {
                kind: FallbackKind::ProviderFailure,
                text: PROVIDER_FAILURE_REPLY.to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_section_override_replaces_system_message_in_request_only() {
        let mut client = MockLLMClient::new();
        client
            .expect_create_chat_completion()
            .times(1)
            .withf(|_, _, request| {
                let json = request_json(request);
                let messages = json["messages"].as_array().unwrap();
                messages.len() == 2
                    && messages[0]["role"] == "system"
                    && messages[0]["content"] == PromptSection::Guidance.text()
            })
            .returning(|_, _, _| Ok("Let's talk careers.".to_string()));
        let gateway = LLMGateway::new(settings("openai", Some("sk-test")), Arc::new(client));

        let persisted = history();
        let reply = gateway
            .generate_response(persisted.clone(), Some(PromptSection::Guidance))
            .await;

        assert_eq!(reply.text(), "Let's talk careers.");
        assert_eq!(persisted[0].content, compiled_prompt());
    }

    #[test]
    fn test_section_override_inserts_missing_system_message() {
        let mut messages = vec![ConversationMessage::user("hi")];
        apply_section_override(&mut messages, PromptSection::Closure);
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], ConversationMessage::system(PromptSection::Closure.text()));
        assert_eq!(messages[1], ConversationMessage::user("hi"));
    }
}
