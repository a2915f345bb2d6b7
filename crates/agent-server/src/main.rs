//! native-agent HTTP Server
//!
//! Axum-based server exposing the style-rewrite pipeline and ETH market
//! commentary as a small REST API.

mod handlers;
mod routes;
mod state;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_runtime::Runtime;
use market_analyst::{EthPriceAnalyzer, FixtureDataSource};

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Provider, styles, filter rules and pipeline
    let runtime = Runtime::from_env()?;
    let provider_name = runtime.settings.kind();

    if runtime.provider().health_check().await {
        tracing::info!("✓ Connected to {}", provider_name);
    } else {
        tracing::warn!("⚠ {} not reachable - rewrites will fail until it is", provider_name);
    }

    let pipeline_config = runtime.pipeline.config();
    let analyzer = EthPriceAnalyzer::new(
        runtime.provider().clone(),
        Arc::new(FixtureDataSource::default()),
    )
    .with_model(runtime.settings.model())
    .with_filter(runtime.filter.clone())
    .with_timeout(pipeline_config.timeout);

    let state = AppState {
        analyzer: Arc::new(analyzer),
        runtime,
    };

    let app = routes::router(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("native-agent server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health           - Health check");
    tracing::info!("  GET  /api/styles       - List rewrite styles");
    tracing::info!("  POST /rewrite          - Rewrite text");
    tracing::info!("  GET  /api/eth/analysis - ETH price commentary");

    axum::serve(listener, app).await?;

    Ok(())
}
