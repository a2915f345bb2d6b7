//! Provider selection
//!
//! `LLM_PROVIDER` picks the adapter; each adapter reads its own variables.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use agent_core::{LlmProvider, config::parse_var, error::ConfigError};

use crate::anthropic::{AnthropicConfig, AnthropicProvider};
use crate::openai::{OpenAiConfig, OpenAiProvider};
#[cfg(feature = "ollama")]
use crate::ollama::{OllamaConfig, OllamaProvider};

/// Which backend to talk to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Anthropic,
    Ollama,
}

impl ProviderKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" | "claude" => Ok(Self::Anthropic),
            "ollama" | "local" => Ok(Self::Ollama),
            other => Err(format!("unknown provider '{other}' (expected openai, anthropic or ollama)")),
        }
    }
}

/// Resolved configuration for the selected provider
#[derive(Clone, Debug)]
pub enum ProviderSettings {
    OpenAi(OpenAiConfig),
    Anthropic(AnthropicConfig),
    #[cfg(feature = "ollama")]
    Ollama(OllamaConfig),
}

impl ProviderSettings {
    pub fn from_env(timeout: Duration) -> Result<Self, ConfigError> {
        Self::from_lookup(&|key: &str| std::env::var(key).ok(), timeout)
    }

    pub fn from_lookup(
        lookup: &impl Fn(&str) -> Option<String>,
        timeout: Duration,
    ) -> Result<Self, ConfigError> {
        let kind: ProviderKind = parse_var(lookup, "LLM_PROVIDER")?.unwrap_or_default();

        match kind {
            ProviderKind::OpenAi => Ok(Self::OpenAi(OpenAiConfig::from_lookup(lookup, timeout)?)),
            ProviderKind::Anthropic => Ok(Self::Anthropic(AnthropicConfig::from_lookup(
                lookup, timeout,
            )?)),
            #[cfg(feature = "ollama")]
            ProviderKind::Ollama => Ok(Self::Ollama(OllamaConfig::from_lookup(lookup, timeout)?)),
            #[cfg(not(feature = "ollama"))]
            ProviderKind::Ollama => Err(ConfigError::InvalidValue {
                name: "LLM_PROVIDER".into(),
                reason: "built without the `ollama` feature".into(),
            }),
        }
    }

    pub const fn kind(&self) -> ProviderKind {
        match self {
            Self::OpenAi(_) => ProviderKind::OpenAi,
            Self::Anthropic(_) => ProviderKind::Anthropic,
            #[cfg(feature = "ollama")]
            Self::Ollama(_) => ProviderKind::Ollama,
        }
    }

    /// Model the provider was configured with
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAi(c) => &c.model,
            Self::Anthropic(c) => &c.model,
            #[cfg(feature = "ollama")]
            Self::Ollama(c) => &c.model,
        }
    }

    /// Instantiate the adapter
    pub fn build(&self) -> Result<Arc<dyn LlmProvider>, ConfigError> {
        let provider: Arc<dyn LlmProvider> = match self {
            Self::OpenAi(c) => Arc::new(OpenAiProvider::new(c.clone())?),
            Self::Anthropic(c) => Arc::new(AnthropicProvider::new(c.clone())?),
            #[cfg(feature = "ollama")]
            Self::Ollama(c) => Arc::new(OllamaProvider::from_config(c.clone())),
        };
        Ok(provider)
    }
}
