//! Error Types for Market Analysis

use agent_core::{ProviderError, RewriteError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalystError>;

#[derive(Error, Debug)]
pub enum AnalystError {
    #[error("At least two price points are required for analysis, got {found}")]
    InsufficientData { found: usize },

    #[error("Market data unavailable: {0}")]
    DataSource(String),

    /// Summary generation or output filtering failed
    #[error(transparent)]
    Generation(#[from] RewriteError),
}

impl From<ProviderError> for AnalystError {
    fn from(err: ProviderError) -> Self {
        Self::Generation(RewriteError::Provider(err))
    }
}

impl AnalystError {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientData { .. } => "insufficient_data",
            Self::DataSource(_) => "data_source",
            Self::Generation(inner) => inner.kind(),
        }
    }
}
