//! Anthropic Provider
//!
//! Implementation of `LlmProvider` for the Anthropic Messages API.

use std::time::Duration;

use agent_core::{
    config::parse_var,
    error::{ConfigError, ProviderError},
    message::Prompt,
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, TokenUsage},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::http;

const API_VERSION: &str = "2023-06-01";

/// Anthropic provider configuration
#[derive(Clone, Debug)]
pub struct AnthropicConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl AnthropicConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.anthropic.com";
    pub const DEFAULT_MODEL: &'static str = "claude-3-5-haiku-latest";

    pub fn from_env(timeout: Duration) -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok(), timeout)
    }

    pub fn from_lookup(
        lookup: &impl Fn(&str) -> Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let api_key = parse_var::<String>(lookup, "ANTHROPIC_API_KEY")?
            .ok_or_else(|| ConfigError::MissingVar("ANTHROPIC_API_KEY".into()))?;

        Ok(Self {
            api_key,
            base_url: parse_var(lookup, "ANTHROPIC_BASE_URL")?
                .unwrap_or_else(|| Self::DEFAULT_BASE_URL.into()),
            model: parse_var(lookup, "ANTHROPIC_MODEL")?
                .unwrap_or_else(|| Self::DEFAULT_MODEL.into()),
            timeout,
        })
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    system: String,
    messages: Vec<InputMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct InputMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Anthropic Messages API provider
pub struct AnthropicProvider {
    client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::build_client(config.timeout)?,
            config,
        })
    }

    pub fn from_env(timeout: Duration) -> Result<Self, ConfigError> {
        Self::new(AnthropicConfig::from_env(timeout)?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request(prompt: &Prompt, options: &GenerationOptions) -> MessagesRequest {
        MessagesRequest {
            model: options.model.clone(),
            system: prompt.system.clone(),
            messages: vec![InputMessage {
                role: "user",
                content: prompt.user.clone(),
            }],
            max_tokens: options.max_tokens,
            temperature: options.temperature,
        }
    }

    fn convert_completion(response: MessagesResponse, requested_model: &str) -> Completion {
        let content = response
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        let mut completion = Completion::new(
            content,
            response.model.unwrap_or_else(|| requested_model.to_string()),
        );
        completion.usage = response
            .usage
            .map(|u| TokenUsage::new(u.input_tokens, u.output_tokens));
        completion.finish_reason = response.stop_reason.as_deref().map(FinishReason::parse);

        if let Some(id) = response.id {
            completion = completion.with_meta("id", id);
        }
        if let Some(raw) = response.stop_reason {
            completion = completion.with_meta("stop_reason", raw);
        }
        completion
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn generate(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<Completion, ProviderError> {
        let request = Self::build_request(prompt, options);

        let response = self
            .client
            .post(self.url("v1/messages"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::classify(&e))?;

        let response = http::check_status(response).await?;
        let body: MessagesResponse = http::decode(response).await?;

        Ok(Self::convert_completion(body, &options.model))
    }

    async fn health_check(&self) -> bool {
        let result = self
            .client
            .get(self.url("v1/models"))
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("Anthropic health check failed: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_requires_key() {
        let err = AnthropicConfig::from_lookup(&|_: &str| None, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar(name) if name == "ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_request_separates_system_prompt() {
        let prompt = Prompt::new("be formal", "rewrite this");
        let options = GenerationOptions {
            model: "claude-3-5-haiku-latest".into(),
            ..GenerationOptions::default()
        };

        let json = serde_json::to_value(AnthropicProvider::build_request(&prompt, &options)).unwrap();
        assert_eq!(json["system"], "be formal");
        assert_eq!(json["messages"].as_array().unwrap().len(), 1);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "rewrite this");
    }

    #[test]
    fn test_completion_joins_text_blocks() {
        let body: MessagesResponse = serde_json::from_value(serde_json::json!({
            "id": "msg_01",
            "model": "claude-3-5-haiku-20241022",
            "content": [
                {"type": "text", "text": "I intend to "},
                {"type": "tool_use", "id": "x", "name": "y", "input": {}},
                {"type": "text", "text": "develop an AI agent."}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 40, "output_tokens": 9}
        }))
        .unwrap();

        let completion = AnthropicProvider::convert_completion(body, "claude-3-5-haiku-latest");
        assert_eq!(completion.content, "I intend to develop an AI agent.");
        assert_eq!(completion.finish_reason, Some(FinishReason::Stop));
        assert_eq!(completion.usage.unwrap().total_tokens, 49);
        assert_eq!(completion.meta["stop_reason"], "end_turn");
    }
}
