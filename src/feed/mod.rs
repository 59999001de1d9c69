//! Bar data feed module
//!
//! Provides OHLCV bar series for symbols via the Yahoo chart API

mod yahoo;

pub use yahoo::{YahooClient, YahooConfig};

use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

use crate::bars::{BarSeries, Timeframe};

/// Trait for bar data source implementations
#[async_trait]
pub trait BarSource: Send + Sync {
    /// Fetch the bar series for one symbol and timeframe
    ///
    /// Returns `Ok(None)` when no data is available (closed market, unknown
    /// symbol); only transport-level problems are errors. Implementations
    /// must bound every request with a timeout.
    async fn fetch(&self, symbol: &str, timeframe: Timeframe)
        -> anyhow::Result<Option<BarSeries>>;
}

/// Retry policy for bar fetches
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts before giving up
    pub attempts: u32,
    /// Delay before the second attempt; doubles per attempt
    pub initial_backoff: Duration,
    /// Ceiling for the doubling backoff
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(10),
        }
    }
}

/// Fetch a series with bounded retries and doubling backoff
///
/// Both transport errors and absent data are retried; `None` is returned
/// once all attempts are exhausted, leaving the caller to record the
/// symbol as failed.
pub async fn fetch_with_retry<S: BarSource + ?Sized>(
    source: &S,
    symbol: &str,
    timeframe: Timeframe,
    policy: &RetryPolicy,
) -> Option<BarSeries> {
    let mut backoff = policy.initial_backoff;

    for attempt in 1..=policy.attempts {
        match source.fetch(symbol, timeframe).await {
            Ok(Some(series)) => return Some(series),
            Ok(None) => {
                tracing::debug!(symbol, timeframe = %timeframe, attempt, "No bar data returned");
            }
            Err(e) => {
                tracing::warn!(
                    symbol,
                    timeframe = %timeframe,
                    attempt,
                    error = %e,
                    "Bar fetch failed"
                );
            }
        }

        if attempt < policy.attempts {
            sleep(backoff).await;
            backoff = (backoff * 2).min(policy.max_backoff);
        }
    }

    None
}
