//! # market-analyst
//!
//! Short-term ETH price commentary: deterministic metrics computed with
//! `rust_decimal`, narrated by whichever `LlmProvider` the runtime selected.
//!
//! ```text
//! MarketDataSource ──► PriceMetrics ──► analyst prompt ──► LlmProvider
//!                                                            │
//!                      EthAnalysis ◄── SafetyFilter::post_filter
//! ```
//!
//! Only an in-process fixture source ships; live exchange feeds plug in
//! through the `MarketDataSource` trait.

pub mod analyzer;
pub mod error;
pub mod model;
pub mod source;

pub use analyzer::{ANALYST_SYSTEM_PROMPT, EthPriceAnalyzer};
pub use error::{AnalystError, Result};
pub use model::{EthAnalysis, PriceMetrics, PricePoint};
pub use source::{FixtureDataSource, MarketDataSource};
