//! Fixture Data Source
//!
//! In-process price history for tests and offline demos.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::MarketDataSource;
use crate::error::{AnalystError, Result};
use crate::model::PricePoint;

/// Static price series
#[derive(Clone, Debug)]
pub struct FixtureDataSource {
    points: Vec<PricePoint>,
}

impl Default for FixtureDataSource {
    /// 25 hourly points from 2024-01-01 00:00 UTC, $1,800 rising $10 per hour
    fn default() -> Self {
        let start = Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default();
        Self::hourly_ramp(start, dec!(1800), dec!(10), 25)
    }
}

impl FixtureDataSource {
    /// Serve `points` as given; must already be chronological
    pub const fn new(points: Vec<PricePoint>) -> Self {
        Self { points }
    }

    /// `count` hourly points starting at `base`, changing by `step` each hour
    pub fn hourly_ramp(start: DateTime<Utc>, base: Decimal, step: Decimal, count: u32) -> Self {
        let points = (0..count)
            .map(|i| {
                PricePoint::new(
                    start + Duration::hours(i64::from(i)),
                    base + step * Decimal::from(i),
                )
            })
            .collect();
        Self { points }
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }
}

#[async_trait]
impl MarketDataSource for FixtureDataSource {
    async fn fetch_price_points(&self) -> Result<Vec<PricePoint>> {
        if self.points.is_empty() {
            return Err(AnalystError::DataSource("fixture has no price points".into()));
        }
        Ok(self.points.clone())
    }

    fn name(&self) -> &str {
        "fixture"
    }
}
