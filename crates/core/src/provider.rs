//! LLM provider selection and per-provider connection settings.

use secrecy::SecretString;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// The chat-completion backends the gateway knows how to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    DeepSeek,
    OpenAI,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown LLM provider: '{0}'")]
pub struct UnknownProvider(pub String);

impl Provider {
    pub fn as_str(self) -> &'static str {
        match self {
            Provider::DeepSeek => "deepseek",
            Provider::OpenAI => "openai",
        }
    }
}

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deepseek" => Ok(Provider::DeepSeek),
            "openai" => Ok(Provider::OpenAI),
            _ => Err(UnknownProvider(s.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where and how to reach one provider.
///
/// `Debug` output redacts the API key.
#[derive(Debug)]
pub struct ProviderSettings {
    pub base_url: String,
    pub api_key: Option<SecretString>,
    pub model: String,
}

impl ProviderSettings {
    pub fn deepseek_defaults(api_key: Option<SecretString>) -> Self {
        Self {
            base_url: "https://api.deepseek.com/v1".to_string(),
            api_key,
            model: "deepseek-chat".to_string(),
        }
    }

    pub fn openai_defaults(api_key: Option<SecretString>) -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key,
            model: "gpt-3.5-turbo".to_string(),
        }
    }

    /// Full URL of the chat-completion endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// Everything the gateway reads from configuration.
///
/// The provider is kept as the raw configured name so that an unrecognized
/// value surfaces as a fallback reply at call time instead of a startup error.
#[derive(Debug)]
pub struct LlmSettings {
    pub provider: String,
    pub deepseek: ProviderSettings,
    pub openai: ProviderSettings,
    pub timeout: Duration,
}

impl LlmSettings {
    pub fn resolve_provider(&self) -> Result<Provider, UnknownProvider> {
        self.provider.parse()
    }

    pub fn endpoint(&self, provider: Provider) -> &ProviderSettings {
        match provider {
            Provider::DeepSeek => &self.deepseek,
            Provider::OpenAI => &self.openai,
        }
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            provider: Provider::DeepSeek.to_string(),
            deepseek: ProviderSettings::deepseek_defaults(None),
            openai: ProviderSettings::openai_defaults(None),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}
