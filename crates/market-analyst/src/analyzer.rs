//! ETH Price Analyzer
//!
//! Computes short-term metrics from a `MarketDataSource` and asks the
//! configured LLM for a narrative. The narrative goes through the same
//! output filter as rewrites before it is returned.

use std::sync::Arc;
use std::time::Duration;

use agent_core::{
    GenerationOptions, LlmProvider, Prompt, ProviderError, SafetyFilter,
};

use crate::error::Result;
use crate::model::{EthAnalysis, PriceMetrics, PricePoint, format_percent, format_usd};
use crate::source::MarketDataSource;

/// System prompt for the market analyst
pub const ANALYST_SYSTEM_PROMPT: &str = "You are a cryptocurrency market analyst focusing on Ethereum (ETH). \
Analyse short-term momentum, key levels, and potential catalysts without giving investment advice.";

/// Points quoted verbatim in the prompt
const RECENT_POINTS: usize = 6;

pub struct EthPriceAnalyzer {
    provider: Arc<dyn LlmProvider>,
    source: Arc<dyn MarketDataSource>,
    filter: Arc<SafetyFilter>,
    options: GenerationOptions,
    timeout: Duration,
}

impl EthPriceAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>, source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            provider,
            source,
            filter: Arc::new(SafetyFilter::builtin()),
            options: GenerationOptions {
                temperature: 0.3,
                max_tokens: 400,
                ..GenerationOptions::default()
            },
            timeout: Duration::from_secs(10),
        }
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.options.model = model.into();
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Arc<SafetyFilter>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Fetch prices, compute metrics and generate the summary
    pub async fn analyze(&self) -> Result<EthAnalysis> {
        let points = self.source.fetch_price_points().await?;
        let metrics = PriceMetrics::from_points(&points)?;

        tracing::debug!(
            source = self.source.name(),
            points = points.len(),
            current = %metrics.current_price,
            "Computed ETH metrics"
        );

        let recent = &points[points.len().saturating_sub(RECENT_POINTS)..];
        let prompt = Self::build_prompt(&metrics, recent);

        let completion =
            match tokio::time::timeout(self.timeout, self.provider.generate(&prompt, &self.options))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(format!(
                    "no response within {}s",
                    self.timeout.as_secs()
                ))),
            };

        let completion = match completion {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "ETH summary generation failed");
                return Err(e.into());
            }
        };

        if completion.content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse.into());
        }

        let filtered = self.filter.post_filter(completion.content.trim())?;

        tracing::info!(
            model = %completion.model,
            redactions = filtered.redactions.len(),
            "ETH analysis complete"
        );

        Ok(EthAnalysis {
            metrics,
            summary: filtered.text,
            model: completion.model,
            redactions: filtered.redactions,
        })
    }

    /// Analyst prompt for the given metrics and trailing window
    pub fn build_prompt(metrics: &PriceMetrics, recent: &[PricePoint]) -> Prompt {
        let price_lines = recent
            .iter()
            .map(|p| format!("- {} UTC: {}", p.timestamp.to_rfc3339(), format_usd(p.price)))
            .collect::<Vec<_>>()
            .join("\n");

        let user = format!(
            "Provide a concise analysis of ETH price action based on the following metrics and recent prices.\n\
             Current price: {}\n\
             1h change: {}\n\
             24h change: {}\n\
             24h high: {}\n\
             24h low: {}\n\
             Recent prices:\n\
             {price_lines}\n\
             Explain momentum, volatility, and notable support/resistance zones.",
            format_usd(metrics.current_price),
            format_percent(metrics.hourly_change_pct),
            format_percent(metrics.daily_change_pct),
            format_usd(metrics.high_24h),
            format_usd(metrics.low_24h),
        );

        Prompt::new(ANALYST_SYSTEM_PROMPT, user)
    }
}
