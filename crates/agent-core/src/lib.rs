//! # agent-core
//!
//! Style-rewrite pipeline with a provider-agnostic LLM abstraction and a
//! deterministic safety filter.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        RewritePipeline                           │
//! │  ┌──────────────┐  ┌──────────────┐  ┌────────────────────────┐  │
//! │  │ StyleCatalog │──│ SafetyFilter │──│   LlmProvider          │  │
//! │  │  (profiles)  │  │  (pre/post)  │  │   (Strategy + retry)   │  │
//! │  └──────────────┘  └──────────────┘  └────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between OpenAI, Anthropic,
//! Ollama or any other backend without changing pipeline logic.

pub mod config;
pub mod error;
pub mod message;
pub mod mock;
pub mod pipeline;
pub mod provider;
pub mod safety;
pub mod style;

pub use config::PipelineConfig;
pub use error::{ConfigError, ProviderError, Result, RewriteError};
pub use message::{Message, Prompt, Role};
pub use pipeline::{PipelineResult, RewriteOutcome, RewritePipeline, RewriteRequest};
pub use provider::{Completion, GenerationOptions, LlmProvider};
pub use safety::{FilterAction, FilteredText, SafetyFilter};
pub use style::{Style, StyleCatalog, StyleProfile};
pub use tokio_util::sync::CancellationToken;
