//! Fair Value Gap detection module
//!
//! Detects three-bar price imbalances (FVG) and their inversions (iFVG)
//! over an ordered bar series. All detection functions are pure: they
//! consume a series snapshot and return value objects, so they are safe to
//! invoke concurrently for different symbols.

mod types;

pub use types::{Fvg, GapDirection, Ifvg, SymbolAnalysis};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::bars::BarSeries;

/// Configuration for gap detection
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum gap size relative to the far boundary (0.001 = 0.1%)
    pub threshold: Decimal,

    /// Bars scanned after a fill for the reversal confirmation
    pub ifvg_lookahead: usize,

    /// Window (in bars from the series end) for recent_fvg/recent_ifvg
    pub recency_window: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            threshold: dec!(0.001), // 0.1%
            ifvg_lookahead: 5,
            recency_window: 10,
        }
    }
}

/// Gap detector over ordered bar series
///
/// Holds only configuration; every call recomputes from the snapshot it is
/// given, so repeated calls on identical input yield identical output.
#[derive(Debug, Clone)]
pub struct FvgDetector {
    config: DetectorConfig,
}

impl FvgDetector {
    /// Create a new detector with the given configuration
    pub fn new(config: DetectorConfig) -> Self {
        Self { config }
    }

    /// Create a detector with default configuration
    pub fn with_defaults() -> Self {
        Self::new(DetectorConfig::default())
    }

    /// Detect Fair Value Gaps in a bar series
    ///
    /// For each bar from index 2 on, compares it to the bar two places back:
    /// a Bullish gap needs before.high < current.low, a Bearish gap needs
    /// before.low > current.high, and in both cases the gap must exceed the
    /// relative threshold. The middle bar only identifies the imbalance
    /// candle; its prices do not gate detection. At most one gap per index.
    ///
    /// Returns an empty list for series shorter than 3 bars or with
    /// non-ascending timestamps.
    pub fn detect_fvg(&self, series: &BarSeries) -> Vec<Fvg> {
        let mut fvgs = Vec::new();
        let bars = series.bars();

        if bars.len() < 3 {
            return fvgs;
        }
        if !series.is_ordered() {
            tracing::warn!("Bar series timestamps not strictly ascending, skipping detection");
            return fvgs;
        }

        for i in 2..bars.len() {
            let before = &bars[i - 2];
            let middle = &bars[i - 1];
            let current = &bars[i];

            if before.high < current.low && !current.low.is_zero() {
                // Gap up between before.high and current.low
                let gap_size = current.low - before.high;
                let gap_fraction = gap_size / current.low;
                if gap_fraction > self.config.threshold {
                    tracing::debug!(
                        timestamp = %current.timestamp,
                        gap_pct = %(gap_fraction * dec!(100)),
                        "Bullish FVG detected"
                    );
                    fvgs.push(Fvg {
                        direction: GapDirection::Bullish,
                        timestamp: current.timestamp,
                        gap_start: before.high,
                        gap_end: current.low,
                        gap_size,
                        gap_percentage: gap_fraction * dec!(100),
                        imbalance_candle: middle.timestamp,
                        price_at_detection: current.close,
                        volume: current.volume,
                    });
                }
            } else if before.low > current.high && !current.high.is_zero() {
                // Gap down between before.low and current.high
                let gap_size = before.low - current.high;
                let gap_fraction = gap_size / current.high;
                if gap_fraction > self.config.threshold {
                    tracing::debug!(
                        timestamp = %current.timestamp,
                        gap_pct = %(gap_fraction * dec!(100)),
                        "Bearish FVG detected"
                    );
                    fvgs.push(Fvg {
                        direction: GapDirection::Bearish,
                        timestamp: current.timestamp,
                        gap_start: before.low,
                        gap_end: current.high,
                        gap_size,
                        gap_percentage: gap_fraction * dec!(100),
                        imbalance_candle: middle.timestamp,
                        price_at_detection: current.close,
                        volume: current.volume,
                    });
                }
            }
        }

        fvgs
    }

    /// Detect inversions of previously detected gaps
    ///
    /// For each gap, scans forward from its anchor bar for the first bar
    /// re-entering the zone (low ≤ gap_start for Bullish, high ≥ gap_start
    /// for Bearish), then looks at most `ifvg_lookahead` bars further for a
    /// reversal beyond gap_end. Only the first fill per gap is considered.
    /// Gaps whose anchor timestamp is not present in the series are logged
    /// and skipped.
    pub fn detect_ifvg(&self, series: &BarSeries, fvgs: &[Fvg]) -> Vec<Ifvg> {
        let mut ifvgs = Vec::new();
        let bars = series.bars();

        for fvg in fvgs {
            let Some(anchor) = series.index_of(fvg.timestamp) else {
                tracing::warn!(
                    timestamp = %fvg.timestamp,
                    "FVG anchor not found in series, skipping inversion check"
                );
                continue;
            };

            let subsequent = &bars[anchor + 1..];
            for (i, bar) in subsequent.iter().enumerate() {
                let filled = match fvg.direction {
                    GapDirection::Bullish => bar.low <= fvg.gap_start,
                    GapDirection::Bearish => bar.high >= fvg.gap_start,
                };
                if !filled {
                    continue;
                }

                let window_end = (i + 1 + self.config.ifvg_lookahead).min(subsequent.len());
                let reversal =
                    subsequent[i + 1..window_end].iter().find(|b| match fvg.direction {
                        GapDirection::Bullish => b.high > fvg.gap_end,
                        GapDirection::Bearish => b.low < fvg.gap_end,
                    });

                if let Some(reversal) = reversal {
                    let fill_price = match fvg.direction {
                        GapDirection::Bullish => bar.low,
                        GapDirection::Bearish => bar.high,
                    };
                    let fill_percentage = if fvg.gap_start.is_zero() {
                        Decimal::ZERO
                    } else {
                        (fvg.gap_start - fill_price).abs() / fvg.gap_start * dec!(100)
                    };
                    tracing::debug!(
                        timestamp = %reversal.timestamp,
                        direction = %fvg.direction,
                        "iFVG detected"
                    );
                    ifvgs.push(Ifvg {
                        direction: fvg.direction,
                        timestamp: reversal.timestamp,
                        origin: fvg.clone(),
                        fill_price,
                        fill_percentage,
                        volume: bar.volume,
                    });
                }

                // Only the first fill/reversal pair per gap
                break;
            }
        }

        ifvgs
    }

    /// Gaps not yet filled per the current price test
    ///
    /// A Bullish gap is active while the last close sits above gap_start, a
    /// Bearish gap while it sits below. Only the gap_start boundary is
    /// checked, never full closure against gap_end; a close inside the zone
    /// still counts as active.
    pub fn active_fvgs(&self, series: &BarSeries, fvgs: &[Fvg]) -> Vec<Fvg> {
        let Some(current_price) = series.last_close() else {
            return Vec::new();
        };

        fvgs.iter()
            .filter(|fvg| match fvg.direction {
                GapDirection::Bullish => current_price > fvg.gap_start,
                GapDirection::Bearish => current_price < fvg.gap_start,
            })
            .cloned()
            .collect()
    }

    /// Run the full analysis for one symbol's series
    ///
    /// Absent or empty data yields the zeroed analysis rather than an error;
    /// a closed market or failed fetch is a normal outcome.
    pub fn analyze_symbol(&self, symbol: &str, series: Option<&BarSeries>) -> SymbolAnalysis {
        let Some(series) = series.filter(|s| !s.is_empty()) else {
            return SymbolAnalysis::empty(symbol);
        };

        let fvgs = self.detect_fvg(series);
        let ifvgs = self.detect_ifvg(series, &fvgs);
        let active_fvgs = self.active_fvgs(series, &fvgs);

        let cutoff = self.recency_cutoff(series);
        let recent_fvg = fvgs.iter().filter(|f| f.timestamp >= cutoff).last().cloned();
        let recent_ifvg = ifvgs.iter().filter(|f| f.timestamp >= cutoff).last().cloned();

        SymbolAnalysis {
            symbol: symbol.to_string(),
            fvgs,
            ifvgs,
            active_fvgs,
            recent_fvg,
            recent_ifvg,
            current_price: series.last_close(),
            analyzed_at: Utc::now(),
        }
    }

    /// Earliest timestamp still considered recent: the bar `recency_window`
    /// places from the end, or the first bar for short series
    fn recency_cutoff(&self, series: &BarSeries) -> DateTime<Utc> {
        let bars = series.bars();
        let idx = bars.len().saturating_sub(self.config.recency_window);
        bars[idx].timestamp
    }
}
