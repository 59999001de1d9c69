//! Scan aggregation module
//!
//! Orchestrates fetch → detect across all symbols and timeframes, diffs
//! consecutive snapshots to surface newly appeared signals, and drives the
//! continuous scan loop with cooperative cancellation.

mod types;

pub use types::{ScanResult, ScanStatistics, SymbolScan};

use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock, Semaphore};
use tokio::task::JoinSet;
use tokio::time::sleep;

use crate::alert::{NewSignalEvent, Notifier};
use crate::bars::{BarSeries, Timeframe};
use crate::detector::FvgDetector;
use crate::feed::{fetch_with_retry, BarSource, RetryPolicy};
use crate::telemetry::{
    increment, record_scan_duration, set_gauge, CounterMetric, GaugeMetric,
};

/// Configuration for the scan aggregator
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub symbols: Vec<String>,
    pub timeframes: Vec<Timeframe>,
    /// Target cadence of the continuous loop
    pub scan_interval: Duration,
    /// Concurrent symbol fetches (rate-limit bound)
    pub concurrency: usize,
    pub retry: RetryPolicy,
    /// Delay before retrying after a whole-cycle outage
    pub cycle_backoff: Duration,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            symbols: Vec::new(),
            timeframes: vec![Timeframe::M5, Timeframe::M15],
            scan_interval: Duration::from_secs(60),
            concurrency: 5,
            retry: RetryPolicy::default(),
            cycle_backoff: Duration::from_secs(5),
        }
    }
}

#[derive(Default)]
struct ScanState {
    current: Option<Arc<ScanResult>>,
    previous: Option<Arc<ScanResult>>,
}

/// Multi-symbol scan aggregator
///
/// Owns the current/previous result pair; each cycle is built off to the
/// side and published by a single reference swap, so status readers never
/// observe a half-built snapshot.
pub struct Scanner {
    source: Arc<dyn BarSource>,
    detector: FvgDetector,
    notifier: Arc<dyn Notifier>,
    config: ScannerConfig,
    scan_count: AtomicU64,
    state: RwLock<ScanState>,
    shutdown: watch::Sender<bool>,
}

impl Scanner {
    /// Create a new scanner
    pub fn new(
        source: Arc<dyn BarSource>,
        detector: FvgDetector,
        notifier: Arc<dyn Notifier>,
        config: ScannerConfig,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            source,
            detector,
            notifier,
            config,
            scan_count: AtomicU64::new(0),
            state: RwLock::new(ScanState::default()),
            shutdown,
        }
    }

    /// Most recent published scan result
    pub async fn latest(&self) -> Option<Arc<ScanResult>> {
        self.state.read().await.current.clone()
    }

    /// Snapshot from the prior cycle; exactly one generation is retained
    pub async fn previous(&self) -> Option<Arc<ScanResult>> {
        self.state.read().await.previous.clone()
    }

    /// Request the continuous loop to stop
    ///
    /// The loop exits before the next symbol fetch or sleep; an in-flight
    /// fetch finishes within its own timeout.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Whether a stop has been requested
    pub fn is_stopped(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Run one scan cycle over all configured symbols
    ///
    /// Per-symbol failures are isolated: a symbol whose every timeframe is
    /// absent or errored after retries is recorded as failed and the rest
    /// of the batch continues. Newly appeared signals (relative to the
    /// previous cycle) are forwarded to the notifier exactly once.
    pub async fn scan_all_symbols(&self) -> Arc<ScanResult> {
        let scan_number = self.scan_count.fetch_add(1, Ordering::SeqCst) + 1;
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::info!(
            scan_number,
            symbols = self.config.symbols.len(),
            "Starting scan"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks: JoinSet<Option<(String, HashMap<Timeframe, Option<BarSeries>>)>> =
            JoinSet::new();

        for symbol in self.config.symbols.clone() {
            let semaphore = semaphore.clone();
            let source = self.source.clone();
            let timeframes = self.config.timeframes.clone();
            let retry = self.config.retry.clone();
            let shutdown = self.shutdown.subscribe();

            tasks.spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return None;
                };
                // Symbols not yet started are skipped once a stop is requested
                if *shutdown.borrow() {
                    return None;
                }

                let mut fetched = HashMap::new();
                for timeframe in timeframes {
                    let series =
                        fetch_with_retry(source.as_ref(), &symbol, timeframe, &retry).await;
                    fetched.insert(timeframe, series);
                }
                Some((symbol, fetched))
            });
        }

        let mut symbols = HashMap::new();
        let mut failed_symbols = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            let fetched = match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Symbol scan task failed");
                    None
                }
            };
            let Some((symbol, fetched)) = fetched else {
                continue;
            };

            let fetch_succeeded = fetched.values().any(Option::is_some);
            let mut timeframes = HashMap::new();
            for (timeframe, series) in &fetched {
                let analysis = self.detector.analyze_symbol(&symbol, series.as_ref());
                timeframes.insert(*timeframe, analysis);
            }

            if !fetch_succeeded {
                tracing::warn!(symbol = %symbol, "All timeframe fetches failed");
                failed_symbols.push(symbol.clone());
            }

            symbols.insert(
                symbol.clone(),
                SymbolScan {
                    symbol,
                    timeframes,
                    fetch_succeeded,
                    scanned_at: Utc::now(),
                },
            );
        }
        failed_symbols.sort();

        // Diff against the previous snapshot before publishing the new one
        let previous = self.state.read().await.current.clone();
        let mut events = Vec::new();
        for scan in symbols.values() {
            events.extend(new_signal_events(previous.as_deref(), scan));
        }
        for event in &events {
            self.notifier.notify(event).await;
        }

        let successful_scans = symbols.values().filter(|s| s.fetch_succeeded).count();
        let result = Arc::new(ScanResult {
            scan_number,
            started_at,
            duration: start.elapsed(),
            symbols,
            successful_scans,
            failed_scans: failed_symbols.len(),
            failed_symbols,
        });

        {
            let mut state = self.state.write().await;
            state.previous = state.current.take();
            state.current = Some(result.clone());
        }

        let stats = result.statistics();
        record_scan_duration(result.duration);
        increment(CounterMetric::ScansCompleted);
        set_gauge(GaugeMetric::SuccessfulScans, result.successful_scans as f64);
        set_gauge(GaugeMetric::FailedScans, result.failed_scans as f64);
        set_gauge(GaugeMetric::ActiveFvgs, stats.total_active_fvgs as f64);
        set_gauge(GaugeMetric::SymbolsWithFvg, stats.symbols_with_fvg as f64);
        set_gauge(GaugeMetric::SymbolsWithIfvg, stats.symbols_with_ifvg as f64);

        tracing::info!(
            scan_number,
            duration_ms = result.duration.as_millis() as u64,
            successful = result.successful_scans,
            failed = result.failed_scans,
            new_signals = events.len(),
            "Scan completed"
        );

        result
    }

    /// Run scan cycles until stopped
    ///
    /// Each cycle's cost is subtracted from the interval to keep the
    /// cadence approximately constant; when a cycle exceeds the interval
    /// the next one starts back to back. A cycle with zero successful
    /// symbols is treated as a transient outage: logged, then retried
    /// after the backoff rather than terminating the loop.
    pub async fn run(&self) {
        let mut shutdown = self.shutdown.subscribe();
        tracing::info!(
            interval_secs = self.config.scan_interval.as_secs(),
            "Starting continuous scan loop"
        );

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let cycle_start = Instant::now();
            let result = self.scan_all_symbols().await;

            let sleep_for = if result.successful_scans == 0 && !self.config.symbols.is_empty() {
                tracing::warn!("Scan cycle yielded no successful symbols, backing off");
                self.config.cycle_backoff
            } else {
                self.config.scan_interval.saturating_sub(cycle_start.elapsed())
            };

            if sleep_for.is_zero() {
                continue;
            }

            tokio::select! {
                _ = sleep(sleep_for) => {}
                _ = shutdown.changed() => break,
            }
        }

        tracing::info!("Scan loop stopped");
    }
}

/// Signals in this scan that were absent (or carried a different pattern
/// timestamp) in the previous cycle's snapshot
fn new_signal_events(previous: Option<&ScanResult>, scan: &SymbolScan) -> Vec<NewSignalEvent> {
    let prev_timeframes = previous
        .and_then(|p| p.symbols.get(&scan.symbol))
        .map(|s| &s.timeframes);

    let mut events = Vec::new();
    for (timeframe, analysis) in &scan.timeframes {
        let prev = prev_timeframes.and_then(|m| m.get(timeframe));

        if let Some(fvg) = &analysis.recent_fvg {
            let prior = prev.and_then(|a| a.recent_fvg.as_ref());
            if prior.map_or(true, |p| p.timestamp != fvg.timestamp) {
                events.push(NewSignalEvent::from_fvg(&scan.symbol, *timeframe, fvg));
            }
        }

        if let Some(ifvg) = &analysis.recent_ifvg {
            let prior = prev.and_then(|a| a.recent_ifvg.as_ref());
            if prior.map_or(true, |p| p.timestamp != ifvg.timestamp) {
                events.push(NewSignalEvent::from_ifvg(&scan.symbol, *timeframe, ifvg));
            }
        }
    }
    events
}
