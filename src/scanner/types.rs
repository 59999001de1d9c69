//! Scan result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::bars::Timeframe;
use crate::detector::SymbolAnalysis;

/// One symbol's analyses across all configured timeframes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolScan {
    pub symbol: String,
    pub timeframes: HashMap<Timeframe, SymbolAnalysis>,
    /// At least one timeframe fetch yielded data
    pub fetch_succeeded: bool,
    pub scanned_at: DateTime<Utc>,
}

/// Immutable snapshot of one full scan cycle
///
/// Owned exclusively by the aggregator and published by reference swap;
/// consumers read it, never mutate it. Only the current and previous
/// snapshots are retained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Monotonic cycle counter, starting at 1
    pub scan_number: u64,
    pub started_at: DateTime<Utc>,
    /// Wall-clock cost of the cycle
    pub duration: Duration,
    pub symbols: HashMap<String, SymbolScan>,
    /// Symbols with at least one successful timeframe fetch
    pub successful_scans: usize,
    pub failed_scans: usize,
    /// Symbols whose every timeframe was absent or errored after retries
    pub failed_symbols: Vec<String>,
}

impl ScanResult {
    /// Roll up the snapshot into summary counts
    pub fn statistics(&self) -> ScanStatistics {
        let mut stats = ScanStatistics {
            scan_number: self.scan_number,
            total_symbols: self.symbols.len(),
            ..ScanStatistics::default()
        };

        for scan in self.symbols.values() {
            let mut has_fvg = false;
            let mut has_ifvg = false;
            for analysis in scan.timeframes.values() {
                if analysis.recent_fvg.is_some() {
                    has_fvg = true;
                    stats.total_fvgs += 1;
                }
                if analysis.recent_ifvg.is_some() {
                    has_ifvg = true;
                    stats.total_ifvgs += 1;
                }
                stats.total_active_fvgs += analysis.active_fvg_count();
            }
            if has_fvg {
                stats.symbols_with_fvg += 1;
            }
            if has_ifvg {
                stats.symbols_with_ifvg += 1;
            }
        }

        stats
    }
}

/// Summary counts over one scan cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStatistics {
    pub scan_number: u64,
    pub total_symbols: usize,
    /// Symbols with a recent gap on any timeframe
    pub symbols_with_fvg: usize,
    /// Symbols with a recent inversion on any timeframe
    pub symbols_with_ifvg: usize,
    /// Timeframe analyses carrying a recent gap
    pub total_fvgs: usize,
    /// Timeframe analyses carrying a recent inversion
    pub total_ifvgs: usize,
    pub total_active_fvgs: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::SymbolAnalysis;

    fn scan(symbol: &str, analyses: Vec<(Timeframe, SymbolAnalysis)>) -> SymbolScan {
        SymbolScan {
            symbol: symbol.to_string(),
            timeframes: analyses.into_iter().collect(),
            fetch_succeeded: true,
            scanned_at: Utc::now(),
        }
    }

    #[test]
    fn test_statistics_empty_result() {
        let result = ScanResult {
            scan_number: 1,
            started_at: Utc::now(),
            duration: Duration::from_millis(10),
            symbols: HashMap::new(),
            successful_scans: 0,
            failed_scans: 0,
            failed_symbols: vec![],
        };

        let stats = result.statistics();
        assert_eq!(stats.scan_number, 1);
        assert_eq!(stats.total_symbols, 0);
        assert_eq!(stats.symbols_with_fvg, 0);
        assert_eq!(stats.total_active_fvgs, 0);
    }

    #[test]
    fn test_statistics_counts_zeroed_analyses() {
        let mut symbols = HashMap::new();
        symbols.insert(
            "AAPL".to_string(),
            scan(
                "AAPL",
                vec![
                    (Timeframe::M5, SymbolAnalysis::empty("AAPL")),
                    (Timeframe::M15, SymbolAnalysis::empty("AAPL")),
                ],
            ),
        );

        let result = ScanResult {
            scan_number: 2,
            started_at: Utc::now(),
            duration: Duration::from_millis(10),
            symbols,
            successful_scans: 1,
            failed_scans: 0,
            failed_symbols: vec![],
        };

        let stats = result.statistics();
        assert_eq!(stats.total_symbols, 1);
        assert_eq!(stats.symbols_with_fvg, 0);
        assert_eq!(stats.symbols_with_ifvg, 0);
        assert_eq!(stats.total_fvgs, 0);
    }
}
