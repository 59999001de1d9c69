//! Yahoo Finance chart API client
//!
//! Fetches OHLCV bars from the public v8 chart endpoint. The endpoint
//! returns one array per quote field with nulls for missing samples; rows
//! with any missing field are dropped before a series is built.

use super::BarSource;
use crate::bars::{Bar, BarSeries, Timeframe};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::{Client, StatusCode};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;

/// Yahoo chart API base URL
pub const YAHOO_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Configuration for the Yahoo chart client
#[derive(Debug, Clone)]
pub struct YahooConfig {
    /// Base URL for the chart API
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Series shorter than this are treated as no data
    pub min_bars: usize,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: YAHOO_API_URL.to_string(),
            timeout: Duration::from_secs(10),
            min_bars: 10,
        }
    }
}

/// Client for the Yahoo chart API
pub struct YahooClient {
    config: YahooConfig,
    client: Client,
}

impl YahooClient {
    /// Create a new client with default configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(YahooConfig::default())
    }

    /// Create a new client with custom configuration
    pub fn with_config(config: YahooConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Parse a chart response body into a bar series
    ///
    /// Returns `Ok(None)` for error payloads, empty results, or series
    /// shorter than `min_bars`.
    fn parse_chart(body: &str, min_bars: usize) -> anyhow::Result<Option<BarSeries>> {
        let response: ChartResponse = serde_json::from_str(body)?;

        if let Some(error) = response.chart.error {
            tracing::debug!(error = %error, "Chart API returned an error payload");
            return Ok(None);
        }

        let Some(result) = response.chart.result.and_then(|mut r| {
            if r.is_empty() {
                None
            } else {
                Some(r.remove(0))
            }
        }) else {
            return Ok(None);
        };

        let timestamps = result.timestamp.unwrap_or_default();
        let Some(quote) = result.indicators.quote.into_iter().next() else {
            return Ok(None);
        };

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, ts) in timestamps.iter().enumerate() {
            let row = (
                quote.open.get(i).copied().flatten(),
                quote.high.get(i).copied().flatten(),
                quote.low.get(i).copied().flatten(),
                quote.close.get(i).copied().flatten(),
                quote.volume.get(i).copied().flatten(),
            );
            let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = row else {
                continue;
            };
            let (Some(open), Some(high), Some(low), Some(close), Some(volume)) = (
                Decimal::from_f64(open),
                Decimal::from_f64(high),
                Decimal::from_f64(low),
                Decimal::from_f64(close),
                Decimal::from_f64(volume),
            ) else {
                continue;
            };
            let Some(timestamp) = Utc.timestamp_opt(*ts, 0).single() else {
                continue;
            };
            bars.push(Bar {
                timestamp,
                open,
                high,
                low,
                close,
                volume,
            });
        }

        if bars.len() < min_bars {
            tracing::debug!(bars = bars.len(), min_bars, "Insufficient bars in chart response");
            return Ok(None);
        }

        Ok(Some(BarSeries::new(bars)))
    }
}

#[async_trait]
impl BarSource for YahooClient {
    async fn fetch(
        &self,
        symbol: &str,
        timeframe: Timeframe,
    ) -> anyhow::Result<Option<BarSeries>> {
        let url = format!("{}/{}", self.config.base_url, symbol);

        tracing::debug!(symbol, timeframe = %timeframe, "Fetching bars from chart API");

        let response = self
            .client
            .get(&url)
            .query(&[
                ("interval", timeframe.as_str()),
                ("range", timeframe.lookback()),
                ("includePrePost", "false"),
            ])
            .send()
            .await?;

        // Unknown symbols come back as 404 with an error payload; that is
        // absence of data, not a transport failure
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("chart API error: {} - {}", status, body);
        }

        let body = response.text().await?;
        Self::parse_chart(&body, self.config.min_bars)
    }
}

/// Top-level chart response envelope
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    /// Bar open times as epoch seconds
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<Quote>,
}

/// Parallel per-field arrays; a null marks a missing sample
#[derive(Debug, Deserialize)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}
