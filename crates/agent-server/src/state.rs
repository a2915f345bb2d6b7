//! Application State

use std::sync::Arc;

use agent_runtime::Runtime;
use market_analyst::EthPriceAnalyzer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Provider, style catalog, safety filter and rewrite pipeline
    pub runtime: Runtime,

    /// ETH commentary, sharing the runtime's provider and filter
    pub analyzer: Arc<EthPriceAnalyzer>,
}
