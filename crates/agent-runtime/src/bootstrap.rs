//! Runtime bootstrap
//!
//! Wires configuration, the selected provider, the style catalog and the
//! safety filter into one shared `RewritePipeline`. Both the HTTP server and
//! the CLI start from here.

use std::path::PathBuf;
use std::sync::Arc;

use agent_core::{
    LlmProvider, PipelineConfig, RewritePipeline, SafetyFilter, StyleCatalog,
    error::ConfigError,
};

use crate::settings::ProviderSettings;

/// Everything read from the environment at startup
#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub pipeline: PipelineConfig,
    pub provider: ProviderSettings,
    pub style_catalog_path: Option<PathBuf>,
    pub filter_rules_path: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key: &str| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let pipeline = PipelineConfig::from_lookup(&lookup)?;
        let provider = ProviderSettings::from_lookup(&lookup, pipeline.timeout)?;
        let path = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
        };

        Ok(Self {
            style_catalog_path: path("STYLE_CATALOG_PATH"),
            filter_rules_path: path("FILTER_RULES_PATH"),
            pipeline,
            provider,
        })
    }
}

/// Shared, immutable application components
#[derive(Clone)]
pub struct Runtime {
    pub settings: ProviderSettings,
    pub catalog: Arc<StyleCatalog>,
    pub filter: Arc<SafetyFilter>,
    pub pipeline: Arc<RewritePipeline>,
}

impl Runtime {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(RuntimeConfig::from_env()?)
    }

    /// Instantiate the configured provider and assemble the pipeline
    pub fn build(config: RuntimeConfig) -> Result<Self, ConfigError> {
        let provider = config.provider.build()?;
        Self::with_provider(config, provider)
    }

    /// Assemble around an already constructed provider
    pub fn with_provider(
        config: RuntimeConfig,
        provider: Arc<dyn LlmProvider>,
    ) -> Result<Self, ConfigError> {
        let catalog = match &config.style_catalog_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading style catalog");
                StyleCatalog::from_path(path)?
            }
            None => StyleCatalog::builtin(),
        };
        let filter = match &config.filter_rules_path {
            Some(path) => {
                tracing::info!(path = %path.display(), "Loading filter rules");
                SafetyFilter::from_path(path)?
            }
            None => SafetyFilter::builtin(),
        };

        let catalog = Arc::new(catalog);
        let filter = Arc::new(filter);
        let pipeline = RewritePipeline::builder()
            .provider(provider)
            .catalog(catalog.clone())
            .filter(filter.clone())
            .config(config.pipeline)
            .model(config.provider.model())
            .build()?;

        tracing::info!(
            provider = %config.provider.kind(),
            model = %config.provider.model(),
            styles = catalog.len(),
            rules = filter.rules().len(),
            "Runtime ready"
        );

        Ok(Self {
            settings: config.provider,
            catalog,
            filter,
            pipeline: Arc::new(pipeline),
        })
    }

    pub fn provider(&self) -> &Arc<dyn LlmProvider> {
        self.pipeline.provider()
    }
}
