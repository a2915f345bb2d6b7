//! Domain Models
//!
//! Price observations and the metrics derived from them.
//! Uses `rust_decimal` for all prices - never use f64 for money!

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::error::{AnalystError, Result};

/// A single ETH/USD observation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

impl PricePoint {
    pub const fn new(timestamp: DateTime<Utc>, price: Decimal) -> Self {
        Self { timestamp, price }
    }
}

/// Short-term metrics over a chronological window
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceMetrics {
    /// Most recent price
    pub current_price: Decimal,

    /// Change versus the previous observation, in percent
    pub hourly_change_pct: Decimal,

    /// Change versus the first observation in the window, in percent
    pub daily_change_pct: Decimal,

    pub high_24h: Decimal,
    pub low_24h: Decimal,
}

impl PriceMetrics {
    /// Compute metrics from chronologically ordered points (at least two)
    pub fn from_points(points: &[PricePoint]) -> Result<Self> {
        let [.., previous, current] = points else {
            return Err(AnalystError::InsufficientData {
                found: points.len(),
            });
        };
        let first = points.first().unwrap_or(previous);

        let high = points.iter().map(|p| p.price).max().unwrap_or(current.price);
        let low = points.iter().map(|p| p.price).min().unwrap_or(current.price);

        Ok(Self {
            current_price: current.price,
            hourly_change_pct: percent_change(previous.price, current.price),
            daily_change_pct: percent_change(first.price, current.price),
            high_24h: high,
            low_24h: low,
        })
    }
}

/// Percentage change from `old` to `new`; zero when `old` is zero
pub fn percent_change(old: Decimal, new: Decimal) -> Decimal {
    if old.is_zero() {
        return Decimal::ZERO;
    }
    (new - old)
        .checked_div(old)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// Metrics plus the generated narrative
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EthAnalysis {
    pub metrics: PriceMetrics,
    pub summary: String,

    /// Model that wrote the summary
    pub model: String,

    /// Placeholder rules applied to the summary
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redactions: Vec<String>,
}

/// `$2,040.00` style rendering
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${grouped}.{cents}")
}

/// `+0.49%` style rendering
pub fn format_percent(pct: Decimal) -> String {
    let rounded = pct.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        "+"
    };
    format!("{sign}{:.2}%", rounded.abs())
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    use super::*;

    fn ramp() -> Vec<PricePoint> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..25)
            .map(|i| PricePoint::new(base + Duration::hours(i), dec!(1800) + Decimal::from(i) * dec!(10)))
            .collect()
    }

    #[test]
    fn test_metrics_from_hourly_ramp() {
        let metrics = PriceMetrics::from_points(&ramp()).unwrap();

        assert_eq!(metrics.current_price, dec!(2040));
        assert_eq!(metrics.high_24h, dec!(2040));
        assert_eq!(metrics.low_24h, dec!(1800));
        assert!((metrics.hourly_change_pct - dec!(0.4926)).abs() < dec!(0.001));
        assert!((metrics.daily_change_pct - dec!(13.3333)).abs() < dec!(0.001));
    }

    #[test]
    fn test_needs_two_points() {
        let one = &ramp()[..1];
        assert!(matches!(
            PriceMetrics::from_points(one),
            Err(AnalystError::InsufficientData { found: 1 })
        ));
        assert!(PriceMetrics::from_points(&[]).is_err());
    }

    #[test]
    fn test_two_points_share_previous_and_first() {
        let points = &ramp()[..2];
        let metrics = PriceMetrics::from_points(points).unwrap();
        assert_eq!(metrics.hourly_change_pct, metrics.daily_change_pct);
    }

    #[test]
    fn test_zero_old_price() {
        assert_eq!(percent_change(Decimal::ZERO, dec!(100)), Decimal::ZERO);
        assert_eq!(percent_change(dec!(200), dec!(100)), dec!(-50));
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(dec!(2040)), "$2,040.00");
        assert_eq!(format_usd(dec!(1234567.891)), "$1,234,567.89");
        assert_eq!(format_usd(dec!(999.995)), "$1,000.00");
        assert_eq!(format_usd(dec!(0.5)), "$0.50");
        assert_eq!(format_usd(dec!(-1500)), "-$1,500.00");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(dec!(0.49261)), "+0.49%");
        assert_eq!(format_percent(dec!(-2.5)), "-2.50%");
        assert_eq!(format_percent(Decimal::ZERO), "+0.00%");
    }

    #[test]
    fn test_metrics_serialize_prices_as_strings() {
        let metrics = PriceMetrics::from_points(&ramp()).unwrap();
        let json = serde_json::to_value(&metrics).unwrap();
        assert_eq!(json["current_price"], "2040");
    }
}
