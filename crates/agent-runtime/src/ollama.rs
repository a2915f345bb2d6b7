//! Ollama LLM Provider
//!
//! Implementation of `LlmProvider` for local Ollama inference.

use std::time::Duration;

use agent_core::{
    config::parse_var,
    error::{ConfigError, ProviderError},
    message::{Message, Prompt, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider},
};
use async_trait::async_trait;
use ollama_rs::{
    Ollama,
    generation::chat::{ChatMessage, ChatMessageResponse, MessageRole, request::ChatMessageRequest},
    models::ModelOptions,
};

/// Ollama provider configuration
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Ollama host URL
    pub host: String,

    /// Ollama port
    pub port: u16,

    /// Local model tag
    pub model: String,

    /// Per-call limit; `ollama-rs` sets none of its own
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost".into(),
            port: 11434,
            model: "llama3.2".into(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl OllamaConfig {
    pub fn from_env(timeout: Duration) -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok(), timeout)
    }

    pub fn from_lookup(
        lookup: &impl Fn(&str) -> Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            host: parse_var(lookup, "OLLAMA_HOST")?.unwrap_or(defaults.host),
            port: parse_var(lookup, "OLLAMA_PORT")?.unwrap_or(defaults.port),
            model: parse_var(lookup, "OLLAMA_MODEL")?.unwrap_or(defaults.model),
            timeout,
        })
    }
}

/// Ollama LLM provider
pub struct OllamaProvider {
    client: Ollama,
    config: OllamaConfig,
}

impl OllamaProvider {
    /// Create from configuration
    pub fn from_config(config: OllamaConfig) -> Self {
        Self {
            client: Ollama::new(config.host.clone(), config.port),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env(timeout: Duration) -> Result<Self, ConfigError> {
        Ok(Self::from_config(OllamaConfig::from_env(timeout)?))
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => MessageRole::System,
                    Role::User => MessageRole::User,
                    Role::Assistant => MessageRole::Assistant,
                };
                ChatMessage::new(role, m.content.clone())
            })
            .collect()
    }

    fn convert_completion(response: ChatMessageResponse, model: &str) -> Completion {
        let mut completion = Completion::new(response.message.content, model);
        completion.finish_reason = Some(FinishReason::Stop);
        completion
    }

    fn build_options(opts: &GenerationOptions) -> ModelOptions {
        ModelOptions::default()
            .temperature(opts.temperature)
            .num_predict(i32::try_from(opts.max_tokens).unwrap_or(i32::MAX))
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<Completion, ProviderError> {
        let request = ChatMessageRequest::new(
            options.model.clone(),
            Self::convert_messages(&prompt.messages()),
        )
        .options(Self::build_options(options));

        let response = tokio::time::timeout(
            self.config.timeout,
            self.client.send_chat_messages(request),
        )
        .await
        .map_err(|_| {
            ProviderError::Timeout(format!("no reply from Ollama within {:?}", self.config.timeout))
        })?
        .map_err(|e| ProviderError::Transport(e.to_string()))?;

        Ok(Self::convert_completion(response, &options.model))
    }

    async fn health_check(&self) -> bool {
        match self.client.list_local_models().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Ollama health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = OllamaConfig::from_lookup(&|_: &str| None, Duration::from_secs(9)).unwrap();
        assert_eq!(config.host, "http://localhost");
        assert_eq!(config.port, 11434);
        assert_eq!(config.model, "llama3.2");
        assert_eq!(config.timeout, Duration::from_secs(9));
    }

    #[test]
    fn test_config_overrides() {
        let map: HashMap<&str, &str> =
            [("OLLAMA_HOST", "http://gpu-box"), ("OLLAMA_PORT", "8080"), ("OLLAMA_MODEL", "mistral")]
                .into_iter()
                .collect();
        let config = OllamaConfig::from_lookup(
            &|key: &str| map.get(key).map(|v| (*v).to_string()),
            Duration::from_secs(30),
        )
        .unwrap();

        assert_eq!(config.host, "http://gpu-box");
        assert_eq!(config.port, 8080);
        assert_eq!(config.model, "mistral");
    }

    #[test]
    fn test_bad_port() {
        let err = OllamaConfig::from_lookup(
            &|key: &str| (key == "OLLAMA_PORT").then(|| "not-a-port".to_string()),
            Duration::from_secs(30),
        );
        assert!(matches!(err, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_message_conversion() {
        let prompt = Prompt::new("You rewrite text.", "Hello");
        let converted = OllamaProvider::convert_messages(&prompt.messages());
        assert_eq!(converted.len(), 2);
    }

    #[tokio::test]
    async fn test_silent_server_is_timeout() {
        // Accepts the connection but never answers
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let provider = OllamaProvider::from_config(OllamaConfig {
            host: "http://127.0.0.1".into(),
            port,
            model: "llama3.2".into(),
            timeout: Duration::from_millis(100),
        });
        let options = GenerationOptions {
            model: "llama3.2".into(),
            ..GenerationOptions::default()
        };
        let err = provider
            .generate(&Prompt::new("You rewrite text.", "Hello"), &options)
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Timeout(_)));
        assert!(err.is_retryable());
        server.abort();
    }
}
