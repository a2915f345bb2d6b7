//! OpenAI Provider
//!
//! Implementation of `LlmProvider` for the OpenAI chat completions API (and
//! any server exposing the same `/chat/completions` shape).

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

/// OpenAI provider configuration
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    pub api_key: String,

    /// API root, without the trailing `/chat/completions`
    pub base_url: String,

    pub model: String,

    /// Request timeout
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o-mini";

    pub fn from_env(timeout: Duration) -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok(), timeout)
    }

    pub fn from_lookup(
        lookup: &impl Fn(&str) -> Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let api_key = parse_var::<String>(lookup, "OPENAI_API_KEY")?
            .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".into()))?;

        Ok(Self {
            api_key,
            base_url: parse_var(lookup, "OPENAI_BASE_URL")?
                .unwrap_or_else(|| Self::DEFAULT_BASE_URL.into()),
            model: parse_var(lookup, "OPENAI_MODEL")?
                .unwrap_or_else(|| Self::DEFAULT_MODEL.into()),
            timeout,
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// OpenAI chat completions provider
pub struct OpenAiProvider {
    client: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiProvider {
    pub fn new(config: OpenAiConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: http::build_client(config.timeout)?,
            config,
        })
    }

    pub fn from_env(timeout: Duration) -> Result<Self, ConfigError> {
        Self::new(OpenAiConfig::from_env(timeout)?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn build_request(prompt: &Prompt, options: &GenerationOptions) -> ChatRequest {
        ChatRequest {
            model: options.model.clone(),
            messages: prompt
                .messages()
                .into_iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str(),
                    content: m.content,
                })
                .collect(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }

    fn convert_completion(response: ChatResponse, requested_model: &str) -> Completion {
        let model = response.model.unwrap_or_else(|| requested_model.to_string());
        let choice = response.choices.into_iter().next();
        let finish = choice.as_ref().and_then(|c| c.finish_reason.clone());
        let content = choice.and_then(|c| c.message.content).unwrap_or_default();

        let mut completion = Completion::new(content, model);
        completion.usage = response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens));
        completion.finish_reason = finish.as_deref().map(FinishReason::parse);

        if let Some(id) = response.id {
            completion = completion.with_meta("id", id);
        }
        if let Some(raw) = finish {
            completion = completion.with_meta("finish_reason", raw);
        }
        completion
    }
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
    ) -> Result<Completion, ProviderError> {
        let request = Self::build_request(prompt, options);

        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| http::classify(&e))?;

        let response = http::check_status(response).await?;
        let body: ChatResponse = http::decode(response).await?;

        Ok(Self::convert_completion(body, &options.model))
    }

    async fn health_check(&self) -> bool {
        let result = self
            .client
            .get(self.url("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await;

        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!("OpenAI health check failed: {}", e);
                false
            }
        }
    }
}
