//! Configuration types for fvg-scanner

use rust_decimal::Decimal;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::alert::AlertConfig;
use crate::bars::Timeframe;
use crate::detector::DetectorConfig;
use crate::feed::RetryPolicy;
use crate::scanner::ScannerConfig;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scanner: ScannerSettings,
    #[serde(default)]
    pub detector: DetectorSettings,
    #[serde(default)]
    pub feed: FeedSettings,
    #[serde(default)]
    pub alerts: AlertSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

/// Scan loop configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerSettings {
    /// Ticker symbols to scan
    pub symbols: Vec<String>,

    /// Timeframes scanned per symbol
    #[serde(default = "default_timeframes")]
    pub timeframes: Vec<Timeframe>,

    /// Target seconds between scan cycles
    #[serde(default = "default_scan_interval")]
    pub scan_interval_secs: u64,

    /// Concurrent symbol fetches (respects source rate limits)
    #[serde(default = "default_concurrency")]
    pub fetch_concurrency: usize,

    /// Fetch attempts per symbol/timeframe before recording a failure
    #[serde(default = "default_retry_attempts")]
    pub fetch_retry_attempts: u32,

    /// Backoff before the second fetch attempt; doubles per attempt
    #[serde(default = "default_retry_backoff")]
    pub fetch_retry_backoff_ms: u64,

    /// Delay before retrying after a cycle with no successful symbols
    #[serde(default = "default_cycle_backoff")]
    pub cycle_backoff_secs: u64,
}

fn default_timeframes() -> Vec<Timeframe> {
    vec![Timeframe::M5, Timeframe::M15]
}
fn default_scan_interval() -> u64 {
    60
}
fn default_concurrency() -> usize {
    5
}
fn default_retry_attempts() -> u32 {
    3
}
fn default_retry_backoff() -> u64 {
    500
}
fn default_cycle_backoff() -> u64 {
    5
}

/// Gap detection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DetectorSettings {
    /// Minimum relative gap size (0.001 = 0.1%)
    #[serde(default = "default_threshold")]
    pub threshold: Decimal,

    /// Bars scanned after a fill for the reversal confirmation
    #[serde(default = "default_lookahead")]
    pub ifvg_lookahead: usize,

    /// Recency window in bars for recent signal selection
    #[serde(default = "default_recency")]
    pub recency_window_bars: usize,
}

fn default_threshold() -> Decimal {
    Decimal::new(1, 3) // 0.001 = 0.1%
}
fn default_lookahead() -> usize {
    5
}
fn default_recency() -> usize {
    10
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            ifvg_lookahead: default_lookahead(),
            recency_window_bars: default_recency(),
        }
    }
}

/// Bar source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    /// Base URL of the chart API
    #[serde(default = "default_feed_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_feed_timeout")]
    pub timeout_secs: u64,

    /// Series shorter than this are treated as no data
    #[serde(default = "default_min_bars")]
    pub min_bars: usize,
}

fn default_feed_url() -> String {
    crate::feed::YahooConfig::default().base_url
}
fn default_feed_timeout() -> u64 {
    10
}
fn default_min_bars() -> usize {
    10
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: default_feed_url(),
            timeout_secs: default_feed_timeout(),
            min_bars: default_min_bars(),
        }
    }
}

/// Alert delivery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AlertSettings {
    /// Print alerts to stdout
    #[serde(default = "default_true")]
    pub console_enabled: bool,

    /// Minimum seconds between alerts for the same signal key
    #[serde(default = "default_cooldown")]
    pub cooldown_secs: u64,

    /// Maximum retained alert records
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Enable the Telegram channel
    #[serde(default)]
    pub telegram_enabled: bool,

    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,
}

fn default_true() -> bool {
    true
}
fn default_cooldown() -> u64 {
    60
}
fn default_history_limit() -> usize {
    200
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            console_enabled: true,
            cooldown_secs: default_cooldown(),
            history_limit: default_history_limit(),
            telegram_enabled: false,
            telegram_bot_token: None,
            telegram_chat_id: None,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Port for the Prometheus exporter; disabled when absent
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            metrics_port: None,
        }
    }
}

/// Configuration faults surfaced once at startup, before any scan runs
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("symbol list is empty")]
    EmptySymbols,
    #[error("no timeframes configured")]
    EmptyTimeframes,
    #[error("fvg threshold must be positive, got {0}")]
    InvalidThreshold(Decimal),
    #[error("fetch concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("fetch retry attempts must be at least 1")]
    ZeroRetryAttempts,
    #[error("telegram alerts enabled but bot token or chat id missing")]
    IncompleteTelegram,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Reject invalid configurations before the scan loop starts
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scanner.symbols.is_empty() {
            return Err(ConfigError::EmptySymbols);
        }
        if self.scanner.timeframes.is_empty() {
            return Err(ConfigError::EmptyTimeframes);
        }
        if self.detector.threshold <= Decimal::ZERO {
            return Err(ConfigError::InvalidThreshold(self.detector.threshold));
        }
        if self.scanner.fetch_concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        if self.scanner.fetch_retry_attempts == 0 {
            return Err(ConfigError::ZeroRetryAttempts);
        }
        if self.alerts.telegram_enabled
            && (self.alerts.telegram_bot_token.is_none() || self.alerts.telegram_chat_id.is_none())
        {
            return Err(ConfigError::IncompleteTelegram);
        }
        Ok(())
    }
}

impl From<&DetectorSettings> for DetectorConfig {
    fn from(settings: &DetectorSettings) -> Self {
        Self {
            threshold: settings.threshold,
            ifvg_lookahead: settings.ifvg_lookahead,
            recency_window: settings.recency_window_bars,
        }
    }
}

impl From<&ScannerSettings> for ScannerConfig {
    fn from(settings: &ScannerSettings) -> Self {
        Self {
            symbols: settings.symbols.clone(),
            timeframes: settings.timeframes.clone(),
            scan_interval: Duration::from_secs(settings.scan_interval_secs),
            concurrency: settings.fetch_concurrency,
            retry: RetryPolicy {
                attempts: settings.fetch_retry_attempts,
                initial_backoff: Duration::from_millis(settings.fetch_retry_backoff_ms),
                ..RetryPolicy::default()
            },
            cycle_backoff: Duration::from_secs(settings.cycle_backoff_secs),
        }
    }
}

impl From<&AlertSettings> for AlertConfig {
    fn from(settings: &AlertSettings) -> Self {
        Self {
            console_enabled: settings.console_enabled,
            cooldown: Duration::from_secs(settings.cooldown_secs),
            history_limit: settings.history_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn full_toml() -> &'static str {
        r#"
            [scanner]
            symbols = ["AAPL", "MSFT"]
            timeframes = ["5m", "15m"]
            scan_interval_secs = 60
            fetch_concurrency = 5
            fetch_retry_attempts = 3
            fetch_retry_backoff_ms = 500

            [detector]
            threshold = 0.001
            ifvg_lookahead = 5
            recency_window_bars = 10

            [feed]
            timeout_secs = 10
            min_bars = 10

            [alerts]
            console_enabled = true
            cooldown_secs = 60

            [telemetry]
            log_level = "info"
            metrics_port = 9090
        "#
    }

    #[test]
    fn test_config_deserialize() {
        let config: Config = toml::from_str(full_toml()).unwrap();
        assert_eq!(config.scanner.symbols, vec!["AAPL", "MSFT"]);
        assert_eq!(
            config.scanner.timeframes,
            vec![Timeframe::M5, Timeframe::M15]
        );
        assert_eq!(config.detector.threshold, dec!(0.001));
        assert_eq!(config.telemetry.metrics_port, Some(9090));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_minimal_uses_defaults() {
        let toml = r#"
            [scanner]
            symbols = ["AAPL"]
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.scanner.scan_interval_secs, 60);
        assert_eq!(config.scanner.fetch_concurrency, 5);
        assert_eq!(config.scanner.fetch_retry_attempts, 3);
        assert_eq!(config.detector.threshold, dec!(0.001));
        assert_eq!(config.detector.ifvg_lookahead, 5);
        assert_eq!(config.detector.recency_window_bars, 10);
        assert!(config.alerts.console_enabled);
        assert!(!config.alerts.telegram_enabled);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.telemetry.metrics_port.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_empty_symbols() {
        let toml = r#"
            [scanner]
            symbols = []
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::EmptySymbols)));
    }

    #[test]
    fn test_validate_invalid_threshold() {
        let toml = r#"
            [scanner]
            symbols = ["AAPL"]

            [detector]
            threshold = 0.0
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold(_))
        ));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let toml = r#"
            [scanner]
            symbols = ["AAPL"]
            fetch_concurrency = 0
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroConcurrency)
        ));
    }

    #[test]
    fn test_validate_incomplete_telegram() {
        let toml = r#"
            [scanner]
            symbols = ["AAPL"]

            [alerts]
            telegram_enabled = true
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::IncompleteTelegram)
        ));
    }

    #[test]
    fn test_config_load_nonexistent() {
        let result = Config::load("/nonexistent/path/config.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_scanner_config_conversion() {
        let config: Config = toml::from_str(full_toml()).unwrap();
        let scanner: ScannerConfig = (&config.scanner).into();
        assert_eq!(scanner.symbols.len(), 2);
        assert_eq!(scanner.scan_interval, Duration::from_secs(60));
        assert_eq!(scanner.retry.attempts, 3);
        assert_eq!(scanner.retry.initial_backoff, Duration::from_millis(500));
    }

    #[test]
    fn test_detector_config_conversion() {
        let settings = DetectorSettings::default();
        let detector: DetectorConfig = (&settings).into();
        assert_eq!(detector.threshold, dec!(0.001));
        assert_eq!(detector.ifvg_lookahead, 5);
        assert_eq!(detector.recency_window, 10);
    }
}
