//! Market Data Sources
//!
//! Abstractions over where price observations come from.

mod fixture;

pub use fixture::FixtureDataSource;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::PricePoint;

/// Price history provider (Strategy pattern)
///
/// Implementations return points oldest first.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    async fn fetch_price_points(&self) -> Result<Vec<PricePoint>>;

    /// Source name
    fn name(&self) -> &str;
}
