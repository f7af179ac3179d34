use secrecy::SecretString;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::Level;
use yovo_core::provider::{LlmSettings, Provider, ProviderSettings};

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// The mode the service runs in; development logs more verbosely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn default_log_level(self) -> Level {
        match self {
            Environment::Development => Level::DEBUG,
            Environment::Production => Level::INFO,
        }
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(format!("'{}' is not 'development' or 'production'", other)),
        }
    }
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub environment: Environment,
    pub log_level: Level,
    pub llm: Arc<LlmSettings>,
    pub static_dir: PathBuf,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let host = host
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidValue("HOST".to_string(), e.to_string()))?;
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        let port = port
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), e.to_string()))?;
        let bind_address = SocketAddr::new(host, port);

        let environment = std::env::var("APP_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .parse::<Environment>()
            .map_err(|e| ConfigError::InvalidValue("APP_ENV".to_string(), e))?;

        let log_level = match std::env::var("RUST_LOG") {
            Ok(level) => level.parse::<Level>().map_err(|_| {
                ConfigError::InvalidValue(
                    "RUST_LOG".to_string(),
                    format!("'{}' is not a valid log level", level),
                )
            })?,
            Err(_) => environment.default_log_level(),
        };

        let provider =
            std::env::var("LLM_PROVIDER").unwrap_or_else(|_| Provider::DeepSeek.to_string());

        let mut deepseek = ProviderSettings::deepseek_defaults(secret_var("DEEPSEEK_API_KEY"));
        if let Ok(url) = std::env::var("DEEPSEEK_API_URL") {
            deepseek.base_url = url;
        }
        if let Ok(model) = std::env::var("DEEPSEEK_MODEL") {
            deepseek.model = model;
        }

        let mut openai = ProviderSettings::openai_defaults(secret_var("OPENAI_API_KEY"));
        if let Ok(url) = std::env::var("OPENAI_API_URL") {
            openai.base_url = url;
        }
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            openai.model = model;
        }

        let timeout_secs = std::env::var("LLM_TIMEOUT_SECS").unwrap_or_else(|_| "30".to_string());
        let timeout = timeout_secs
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "LLM_TIMEOUT_SECS".to_string(),
                    format!("'{}' is not a positive number of seconds", timeout_secs),
                )
            })?;

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./public"));

        Ok(Self {
            bind_address,
            environment,
            log_level,
            llm: Arc::new(LlmSettings {
                provider,
                deepseek,
                openai,
                timeout,
            }),
            static_dir,
        })
    }

    /// The name of the configured provider's API key variable, if that key is
    /// absent. Missing keys are not fatal; the gateway answers with a
    /// configuration fallback instead.
    pub fn missing_api_key_var(&self) -> Option<&'static str> {
        match self.llm.resolve_provider() {
            Ok(Provider::DeepSeek) if self.llm.deepseek.api_key.is_none() => {
                Some("DEEPSEEK_API_KEY")
            }
            Ok(Provider::OpenAI) if self.llm.openai.api_key.is_none() => Some("OPENAI_API_KEY"),
            _ => None,
        }
    }
}

fn secret_var(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}
