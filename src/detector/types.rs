//! Gap detection types
//!
//! Value objects describing detected Fair Value Gaps, their inversions, and
//! the per-symbol analysis summary. All are recomputed from scratch on every
//! scan; nothing here holds references back into scanner state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a detected gap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GapDirection {
    /// Gap up: demand imbalance
    Bullish,
    /// Gap down: supply imbalance
    Bearish,
}

impl fmt::Display for GapDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapDirection::Bullish => f.write_str("Bullish"),
            GapDirection::Bearish => f.write_str("Bearish"),
        }
    }
}

/// A Fair Value Gap: three-bar pattern leaving an untraded price zone
///
/// Anchored at the bar that completes the pattern; the middle bar is the
/// imbalance candle. The gap zone runs from `gap_start` (the boundary price
/// tested for fills) to `gap_end`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fvg {
    pub direction: GapDirection,
    /// Timestamp of the bar completing the pattern
    pub timestamp: DateTime<Utc>,
    /// Near boundary of the zone: before.high (Bullish) or before.low (Bearish)
    pub gap_start: Decimal,
    /// Far boundary of the zone: current.low (Bullish) or current.high (Bearish)
    pub gap_end: Decimal,
    pub gap_size: Decimal,
    /// Gap size relative to the far boundary, in percent
    pub gap_percentage: Decimal,
    /// Timestamp of the middle (imbalance) bar
    pub imbalance_candle: DateTime<Utc>,
    /// Close of the anchor bar when the gap was detected
    pub price_at_detection: Decimal,
    /// Volume of the anchor bar
    pub volume: Decimal,
}

/// An Inversion Fair Value Gap
///
/// Emitted when price re-enters a previously detected gap zone (the fill)
/// and then reverses beyond the zone's far boundary within a bounded number
/// of bars. The timestamp is the bar that confirmed the reversal, not the
/// fill bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ifvg {
    /// Mirrors the originating gap's direction
    pub direction: GapDirection,
    /// Timestamp of the reversal-confirming bar
    pub timestamp: DateTime<Utc>,
    /// The gap this inversion originated from
    pub origin: Fvg,
    /// Low (Bullish) or high (Bearish) of the fill bar
    pub fill_price: Decimal,
    /// Fill depth relative to gap_start, in percent
    pub fill_percentage: Decimal,
    /// Volume of the fill bar
    pub volume: Decimal,
}

/// Per-symbol, per-timeframe analysis summary
///
/// Fully replaced each scan cycle. An absent or empty series yields the
/// zeroed analysis from [`SymbolAnalysis::empty`]; absence of data is a
/// normal outcome, not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolAnalysis {
    pub symbol: String,
    pub fvgs: Vec<Fvg>,
    pub ifvgs: Vec<Ifvg>,
    /// Gaps not yet filled per the current price test
    pub active_fvgs: Vec<Fvg>,
    /// Latest gap whose timestamp falls within the recency window
    pub recent_fvg: Option<Fvg>,
    /// Latest inversion whose timestamp falls within the recency window
    pub recent_ifvg: Option<Ifvg>,
    /// Close of the most recent bar, if any data was available
    pub current_price: Option<Decimal>,
    pub analyzed_at: DateTime<Utc>,
}

impl SymbolAnalysis {
    /// Zeroed analysis for a symbol with no data
    pub fn empty(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            fvgs: Vec::new(),
            ifvgs: Vec::new(),
            active_fvgs: Vec::new(),
            recent_fvg: None,
            recent_ifvg: None,
            current_price: None,
            analyzed_at: Utc::now(),
        }
    }

    pub fn fvg_count(&self) -> usize {
        self.fvgs.len()
    }

    pub fn ifvg_count(&self) -> usize {
        self.ifvgs.len()
    }

    pub fn active_fvg_count(&self) -> usize {
        self.active_fvgs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gap_direction_display() {
        assert_eq!(GapDirection::Bullish.to_string(), "Bullish");
        assert_eq!(GapDirection::Bearish.to_string(), "Bearish");
    }

    #[test]
    fn test_empty_analysis() {
        let analysis = SymbolAnalysis::empty("AAPL");
        assert_eq!(analysis.symbol, "AAPL");
        assert_eq!(analysis.fvg_count(), 0);
        assert_eq!(analysis.ifvg_count(), 0);
        assert_eq!(analysis.active_fvg_count(), 0);
        assert!(analysis.recent_fvg.is_none());
        assert!(analysis.recent_ifvg.is_none());
        assert!(analysis.current_price.is_none());
    }
}
