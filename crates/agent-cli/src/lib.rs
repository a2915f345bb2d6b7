//! # agent-cli
//!
//! `native-agent` command-line frontend. Configuration comes from the same
//! environment variables (and `.env`) as the HTTP server.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use agent_core::{RewriteError, RewriteRequest, StyleCatalog, pipeline::DEFAULT_STYLE};
use agent_runtime::Runtime;
use market_analyst::{EthAnalysis, EthPriceAnalyzer, FixtureDataSource, model};

#[derive(Debug, Parser)]
#[command(
    name = "native-agent",
    version,
    about = "Rewrite text into a chosen tone with an LLM",
    after_help = "Examples:\n  native-agent rewrite \"hey can u send the report\" --style professional\n  native-agent styles\n  native-agent eth"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    #[command(about = "Rewrite TEXT into the chosen style and print the result")]
    Rewrite {
        /// Text to rewrite
        text: String,

        #[arg(long, short, default_value = DEFAULT_STYLE, help = "casual, professional, concise or friendly")]
        style: String,

        #[arg(long, help = "Additional guidance for this request")]
        extra_instructions: Option<String>,

        #[arg(long, help = "Override the configured model")]
        model: Option<String>,
    },
    #[command(about = "List available rewrite styles")]
    Styles,
    #[command(about = "Summarise recent ETH price action")]
    Eth,
}

impl Command {
    /// Build the pipeline request for `rewrite`
    pub fn rewrite_request(&self) -> Option<RewriteRequest> {
        let Self::Rewrite {
            text,
            style,
            extra_instructions,
            model,
        } = self
        else {
            return None;
        };

        let mut request = RewriteRequest::new(text.clone(), style.clone());
        request.extra_instructions.clone_from(extra_instructions);
        request.model.clone_from(model);
        Some(request)
    }
}

/// Execute a parsed command and return what should go to stdout
pub async fn run(cli: Cli) -> anyhow::Result<String> {
    match &cli.command {
        Command::Rewrite { .. } => {
            let runtime = Runtime::from_env().context("configuration error")?;
            let request = cli
                .command
                .rewrite_request()
                .context("not a rewrite command")?;

            let outcome = runtime.pipeline.rewrite(&request).await?;
            tracing::debug!(attempts = outcome.attempts, model = %outcome.model, "Rewrite finished");
            Ok(outcome.text)
        }
        Command::Styles => {
            let catalog = match std::env::var("STYLE_CATALOG_PATH") {
                Ok(path) if !path.trim().is_empty() => StyleCatalog::from_path(&path)
                    .with_context(|| format!("failed to load style catalog from {path}"))?,
                _ => StyleCatalog::builtin(),
            };
            Ok(render_styles(&catalog))
        }
        Command::Eth => {
            let runtime = Runtime::from_env().context("configuration error")?;
            let analyzer = EthPriceAnalyzer::new(
                runtime.provider().clone(),
                Arc::new(FixtureDataSource::default()),
            )
            .with_model(runtime.settings.model())
            .with_filter(runtime.filter.clone())
            .with_timeout(runtime.pipeline.config().timeout);

            let analysis = analyzer.analyze().await?;
            Ok(render_analysis(&analysis))
        }
    }
}

/// Message for stderr; pipeline failures get their user-facing wording
pub fn describe_error(err: &anyhow::Error) -> String {
    if let Some(rewrite) = err.downcast_ref::<RewriteError>() {
        return rewrite.user_message();
    }
    if let Some(market_analyst::AnalystError::Generation(rewrite)) =
        err.downcast_ref::<market_analyst::AnalystError>()
    {
        return rewrite.user_message();
    }
    format!("{err:#}")
}

pub fn render_styles(catalog: &StyleCatalog) -> String {
    let mut out = String::new();
    for profile in catalog.profiles() {
        let _ = writeln!(out, "{:<13} {}", profile.style.as_str(), profile.instruction);
        if !profile.tone_constraints.is_empty() {
            let _ = writeln!(out, "{:<13} ({})", "", profile.tone_constraints.join("; "));
        }
    }
    out.trim_end().to_string()
}

pub fn render_analysis(analysis: &EthAnalysis) -> String {
    let m = &analysis.metrics;
    format!(
        "ETH {}  1h {}  24h {}\n24h range {} - {}\n\n{}",
        model::format_usd(m.current_price),
        model::format_percent(m.hourly_change_pct),
        model::format_percent(m.daily_change_pct),
        model::format_usd(m.low_24h),
        model::format_usd(m.high_24h),
        analysis.summary,
    )
}

#[cfg(test)]
mod tests {
    use agent_core::{ProviderError, mock::ScriptedProvider};

    use super::*;

    #[test]
    fn test_rewrite_defaults_to_professional() {
        let cli = Cli::try_parse_from(["native-agent", "rewrite", "i wanna build an ai agent"]).unwrap();
        let request = cli.command.rewrite_request().unwrap();

        assert_eq!(request.text, "i wanna build an ai agent");
        assert_eq!(request.style, "professional");
        assert!(request.extra_instructions.is_none());
        assert!(request.model.is_none());
    }

    #[test]
    fn test_rewrite_flags() {
        let cli = Cli::try_parse_from([
            "native-agent",
            "rewrite",
            "hello",
            "--style",
            "casual",
            "--extra-instructions",
            "keep it short",
            "--model",
            "gpt-4o",
        ])
        .unwrap();
        let request = cli.command.rewrite_request().unwrap();

        assert_eq!(request.style, "casual");
        assert_eq!(request.extra_instructions.as_deref(), Some("keep it short"));
        assert_eq!(request.model.as_deref(), Some("gpt-4o"));
    }

    #[test]
    fn test_rewrite_requires_text() {
        assert!(Cli::try_parse_from(["native-agent", "rewrite"]).is_err());
    }

    #[test]
    fn test_other_commands() {
        let cli = Cli::try_parse_from(["native-agent", "styles"]).unwrap();
        assert_eq!(cli.command, Command::Styles);
        assert!(cli.command.rewrite_request().is_none());

        let cli = Cli::try_parse_from(["native-agent", "eth"]).unwrap();
        assert_eq!(cli.command, Command::Eth);
    }

    #[test]
    fn test_render_styles() {
        let output = render_styles(&StyleCatalog::builtin());
        let first_words: Vec<&str> = output
            .lines()
            .filter_map(|l| l.split_whitespace().next())
            .filter(|w| !w.starts_with('('))
            .collect();

        assert_eq!(first_words, ["casual", "professional", "concise", "friendly"]);
        assert!(output.contains("no slang"));
    }

    #[test]
    fn test_describe_rewrite_error() {
        let err = anyhow::Error::new(RewriteError::Provider(ProviderError::RateLimit("429".into())));
        assert_eq!(
            describe_error(&err),
            "The AI service is busy. Please wait a moment and try again."
        );

        let other = anyhow::anyhow!("boom").context("configuration error");
        assert_eq!(describe_error(&other), "configuration error: boom");
    }

    #[tokio::test]
    async fn test_render_analysis() {
        let provider = Arc::new(ScriptedProvider::always("ETH grinds higher."));
        let analysis = EthPriceAnalyzer::new(provider, Arc::new(FixtureDataSource::default()))
            .analyze()
            .await
            .unwrap();

        let output = render_analysis(&analysis);
        assert!(output.starts_with("ETH $2,040.00  1h +0.49%  24h +13.33%"));
        assert!(output.contains("24h range $1,800.00 - $2,040.00"));
        assert!(output.ends_with("ETH grinds higher."));
    }
}
