//! OHLCV bar series types
//!
//! A `BarSeries` is an immutable per-scan snapshot of price bars for one
//! symbol and one timeframe, sorted ascending by timestamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Sampling interval of a bar series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    /// 5-minute bars
    #[serde(rename = "5m")]
    M5,
    /// 15-minute bars
    #[serde(rename = "15m")]
    M15,
    /// 1-hour bars
    #[serde(rename = "1h")]
    H1,
}

impl Timeframe {
    /// Interval string as understood by the chart API
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
        }
    }

    /// Lookback range requested from the data source for this interval
    pub fn lookback(&self) -> &'static str {
        match self {
            Timeframe::M5 => "1d",
            Timeframe::M15 => "2d",
            Timeframe::H1 => "5d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" => Ok(Timeframe::M5),
            "15m" => Ok(Timeframe::M15),
            "1h" => Ok(Timeframe::H1),
            other => Err(format!("unknown timeframe: {other}")),
        }
    }
}

/// A single OHLCV sample for a fixed time interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time
    pub timestamp: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

/// An ordered snapshot of bars for one symbol/timeframe
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    /// Create a series from bars already ordered by the source
    pub fn new(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Close of the most recent bar
    pub fn last_close(&self) -> Option<Decimal> {
        self.bars.last().map(|b| b.close)
    }

    /// Timestamps strictly ascending (the well-formedness invariant)
    pub fn is_ordered(&self) -> bool {
        self.bars.windows(2).all(|w| w[0].timestamp < w[1].timestamp)
    }

    /// Index of the bar with the given timestamp
    pub fn index_of(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.bars
            .binary_search_by_key(&timestamp, |b| b.timestamp)
            .ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn bar(minute: u32, close: Decimal) -> Bar {
        Bar {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, minute, 0).unwrap(),
            open: close,
            high: close + dec!(0.5),
            low: close - dec!(0.5),
            close,
            volume: dec!(1000),
        }
    }

    #[test]
    fn test_timeframe_roundtrip() {
        for tf in [Timeframe::M5, Timeframe::M15, Timeframe::H1] {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
        assert!("3m".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_empty_series() {
        let series = BarSeries::default();
        assert!(series.is_empty());
        assert!(series.is_ordered());
        assert!(series.last_close().is_none());
    }

    #[test]
    fn test_ordered_series() {
        let series = BarSeries::new(vec![bar(0, dec!(100)), bar(5, dec!(101)), bar(10, dec!(102))]);
        assert!(series.is_ordered());
        assert_eq!(series.last_close(), Some(dec!(102)));
    }

    #[test]
    fn test_unordered_series() {
        let series = BarSeries::new(vec![bar(5, dec!(100)), bar(0, dec!(101))]);
        assert!(!series.is_ordered());
    }

    #[test]
    fn test_duplicate_timestamps_not_ordered() {
        let series = BarSeries::new(vec![bar(0, dec!(100)), bar(0, dec!(101))]);
        assert!(!series.is_ordered());
    }

    #[test]
    fn test_index_of() {
        let series = BarSeries::new(vec![bar(0, dec!(100)), bar(5, dec!(101)), bar(10, dec!(102))]);
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 5, 0).unwrap();
        assert_eq!(series.index_of(ts), Some(1));

        let missing = Utc.with_ymd_and_hms(2024, 1, 15, 10, 7, 0).unwrap();
        assert_eq!(series.index_of(missing), None);
    }
}
