//! # agent-runtime
//!
//! Provider adapters and startup wiring for native-agent.
//!
//! ## Providers
//!
//! - **OpenAI** (default): chat completions API, or any compatible server via `OPENAI_BASE_URL`
//! - **Anthropic**: Messages API
//! - **Ollama**: local inference (feature `ollama`, on by default)
//!
//! `LLM_PROVIDER` selects the adapter.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::Runtime;
//! use agent_core::RewriteRequest;
//!
//! let runtime = Runtime::from_env()?;
//! let outcome = runtime
//!     .pipeline
//!     .rewrite(&RewriteRequest::new("hey, can u send the report", "professional"))
//!     .await?;
//! ```

pub mod anthropic;
pub mod bootstrap;
mod http;
pub mod openai;
pub mod settings;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use anthropic::AnthropicProvider;
pub use bootstrap::{Runtime, RuntimeConfig};
pub use openai::OpenAiProvider;
pub use settings::{ProviderKind, ProviderSettings};

#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;

// Re-export core types for convenience
pub use agent_core::{
    CancellationToken, ConfigError, LlmProvider, ProviderError, RewriteError, RewriteOutcome,
    RewritePipeline, RewriteRequest,
};
