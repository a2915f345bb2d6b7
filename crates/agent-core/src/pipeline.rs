//! Rewrite Pipeline
//!
//! Drives one rewrite request through its stages:
//!
//! ```text
//! Validating → StyleResolved → PreFiltered → Generating → PostFiltered → Done
//!      └──────────────┴──────────────┴─────────────┴──────────────┴──→ Failed(kind)
//! ```
//!
//! Shared state (provider, catalog, filter) is read-only, so one pipeline
//! can serve any number of concurrent requests.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::config::PipelineConfig;
use crate::error::{ProviderError, Result, RewriteError};
use crate::message::Prompt;
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::safety::SafetyFilter;
use crate::style::{Style, StyleCatalog, StyleProfile};

const BASE_SYSTEM_PROMPT: &str = "You are an assistant that rewrites user text into natural, \
native English while preserving meaning. You fix grammar, clarity, and tone according to the \
requested style. Do not add new information. If text is already natural, return it with minimal \
edits.";

/// Style used when a frontend does not name one
pub const DEFAULT_STYLE: &str = "professional";

fn default_style() -> String {
    DEFAULT_STYLE.into()
}

/// One rewrite request, owned by the calling handler
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteRequest {
    pub text: String,

    #[serde(default = "default_style")]
    pub style: String,

    /// Additional guidance appended to the style's constraints
    #[serde(default)]
    pub extra_instructions: Option<String>,

    /// Override of the configured model
    #[serde(default)]
    pub model: Option<String>,
}

impl RewriteRequest {
    pub fn new(text: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: style.into(),
            extra_instructions: None,
            model: None,
        }
    }

    #[must_use]
    pub fn with_extra_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.extra_instructions = Some(instructions.into());
        self
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Successful rewrite
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RewriteOutcome {
    pub text: String,
    pub style: Style,
    pub model: String,

    /// Provider calls made, including retries
    pub attempts: u32,

    /// Names of rules that redacted input or output
    pub redactions: Vec<String>,
}

/// Discriminated outcome of one request
pub type PipelineResult = std::result::Result<RewriteOutcome, RewriteError>;

/// Pipeline stage, tracked for logging. A stage is entered before its step
/// runs, so a failure is reported against the step that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Validating,
    StyleResolved,
    PreFiltered,
    Generating,
    PostFiltered,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validating => "validating",
            Self::StyleResolved => "style_resolved",
            Self::PreFiltered => "pre_filtered",
            Self::Generating => "generating",
            Self::PostFiltered => "post_filtered",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Orchestrates validation, style selection, filtering and generation
#[derive(Clone)]
pub struct RewritePipeline {
    provider: Arc<dyn LlmProvider>,
    catalog: Arc<StyleCatalog>,
    filter: Arc<SafetyFilter>,
    config: PipelineConfig,
}

impl RewritePipeline {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        catalog: Arc<StyleCatalog>,
        filter: Arc<SafetyFilter>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            provider,
            catalog,
            filter,
            config,
        }
    }

    pub fn builder() -> RewritePipelineBuilder {
        RewritePipelineBuilder::new()
    }

    /// Run a request to completion
    pub async fn rewrite(&self, request: &RewriteRequest) -> PipelineResult {
        self.rewrite_with_cancel(request, &CancellationToken::new()).await
    }

    /// Run a request, abandoning provider calls and backoff once `cancel` fires
    pub async fn rewrite_with_cancel(
        &self,
        request: &RewriteRequest,
        cancel: &CancellationToken,
    ) -> PipelineResult {
        let mut stage = PipelineStage::Validating;
        let result = self.run(request, cancel, &mut stage).await;

        match &result {
            Ok(outcome) => tracing::info!(
                style = %outcome.style,
                model = %outcome.model,
                attempts = outcome.attempts,
                redactions = outcome.redactions.len(),
                "Rewrite completed"
            ),
            Err(e) => tracing::warn!(
                kind = e.kind(),
                stage = %stage,
                error = %e,
                "Rewrite failed"
            ),
        }

        result
    }

    async fn run(
        &self,
        request: &RewriteRequest,
        cancel: &CancellationToken,
        stage: &mut PipelineStage,
    ) -> PipelineResult {
        self.validate(request)?;

        *stage = PipelineStage::StyleResolved;
        let profile = self.catalog.resolve(&request.style)?;

        *stage = PipelineStage::PreFiltered;
        let input = self.filter.pre_filter(&request.text)?;
        let extra = request
            .extra_instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| self.filter.pre_filter(s))
            .transpose()?;

        let mut redactions = input.redactions;
        let extra_text = extra.map(|filtered| {
            redactions.extend(filtered.redactions);
            filtered.text
        });

        let prompt = self.build_prompt(profile, &input.text, extra_text.as_deref());
        let options = self.generation_options(profile, request);

        *stage = PipelineStage::Generating;
        let (completion, attempts) = self.generate_with_retry(&prompt, &options, cancel).await?;

        let generated = completion.content.trim();
        if generated.is_empty() {
            return Err(ProviderError::EmptyResponse.into());
        }

        *stage = PipelineStage::PostFiltered;
        let output = self.filter.post_filter(generated)?;
        redactions.extend(output.redactions);

        *stage = PipelineStage::Done;
        Ok(RewriteOutcome {
            text: output.text,
            style: profile.style,
            model: options.model,
            attempts,
            redactions,
        })
    }

    fn validate(&self, request: &RewriteRequest) -> Result<()> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(RewriteError::Validation("text must not be empty".into()));
        }

        let max = self.config.max_input_chars;
        if text.chars().count() > max {
            return Err(RewriteError::Validation(format!(
                "text exceeds the maximum of {max} characters"
            )));
        }

        if let Some(extra) = &request.extra_instructions {
            if extra.chars().count() > max {
                return Err(RewriteError::Validation(format!(
                    "extra instructions exceed the maximum of {max} characters"
                )));
            }
        }

        Ok(())
    }

    /// Substitute the filtered text into the style template and append
    /// the tone constraints.
    pub fn build_prompt(&self, profile: &StyleProfile, text: &str, extra: Option<&str>) -> Prompt {
        let system = format!("{BASE_SYSTEM_PROMPT} Style: {}", profile.instruction);

        let mut user = profile.render(text.trim());
        let constraints: Vec<&str> = profile
            .tone_constraints
            .iter()
            .map(String::as_str)
            .chain(extra)
            .collect();

        if !constraints.is_empty() {
            user.push_str("\n\nConstraints:");
            for constraint in constraints {
                user.push_str("\n- ");
                user.push_str(constraint);
            }
        }

        Prompt::new(system, user)
    }

    fn generation_options(&self, profile: &StyleProfile, request: &RewriteRequest) -> GenerationOptions {
        let mut options = self.config.generation.clone();
        if let Some(model) = request.model.as_deref().map(str::trim).filter(|m| !m.is_empty()) {
            options.model = model.to_string();
        }
        options.temperature = profile.temperature;
        options.constraints.clone_from(&profile.tone_constraints);
        options
    }

    /// Call the provider, retrying rate limits and timeouts with
    /// exponential backoff. Returns the completion and the attempt count.
    async fn generate_with_retry(
        &self,
        prompt: &Prompt,
        options: &GenerationOptions,
        cancel: &CancellationToken,
    ) -> Result<(Completion, u32)> {
        let max_attempts = self.config.max_attempts.max(1);
        let timeout = self.config.timeout;
        let mut attempt = 0;

        loop {
            attempt += 1;

            if cancel.is_cancelled() {
                return Err(RewriteError::Cancelled);
            }

            tracing::debug!(
                provider = self.provider.name(),
                model = %options.model,
                attempt,
                "Calling provider"
            );

            let call = tokio::time::timeout(timeout, self.provider.generate(prompt, options));
            let result = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(RewriteError::Cancelled),
                result = call => result.unwrap_or_else(|_| {
                    Err(ProviderError::Timeout(format!("no response within {timeout:?}")))
                }),
            };

            match result {
                Ok(completion) => return Ok((completion, attempt)),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.backoff_delay(attempt);
                    tracing::warn!(
                        kind = e.kind(),
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Transient provider failure, backing off"
                    );

                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return Err(RewriteError::Cancelled),
                        () = tokio::time::sleep(delay) => {}
                    }
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// `backoff_base * 2^(attempt - 1)`, capped at `backoff_max`
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.config
            .backoff_base
            .saturating_mul(factor)
            .min(self.config.backoff_max)
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn filter(&self) -> &SafetyFilter {
        &self.filter
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        &self.provider
    }

    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }
}

/// Builder for [`RewritePipeline`]
pub struct RewritePipelineBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    catalog: Option<Arc<StyleCatalog>>,
    filter: Option<Arc<SafetyFilter>>,
    config: PipelineConfig,
}

impl Default for RewritePipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RewritePipelineBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            catalog: None,
            filter: None,
            config: PipelineConfig::default(),
        }
    }

    #[must_use]
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    #[must_use]
    pub fn catalog(mut self, catalog: Arc<StyleCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    #[must_use]
    pub fn filter(mut self, filter: Arc<SafetyFilter>) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    #[must_use]
    pub fn backoff(mut self, base: Duration, max: Duration) -> Self {
        self.config.backoff_base = base;
        self.config.backoff_max = max;
        self
    }

    pub fn build(self) -> std::result::Result<RewritePipeline, crate::error::ConfigError> {
        let provider = self
            .provider
            .ok_or_else(|| crate::error::ConfigError::MissingVar("provider".into()))?;

        Ok(RewritePipeline::new(
            provider,
            self.catalog.unwrap_or_else(|| Arc::new(StyleCatalog::builtin())),
            self.filter.unwrap_or_else(|| Arc::new(SafetyFilter::builtin())),
            self.config,
        ))
    }
}
