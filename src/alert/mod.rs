//! Alert delivery module
//!
//! Receives newly detected signals from the aggregator and fans them out
//! across the configured channels. Delivery is cooldown-gated per
//! symbol/timeframe/kind/direction to prevent alert spam, and channel
//! failures are logged here, never propagated back into the scan loop.

mod telegram;
mod types;

pub use telegram::{TelegramChannel, TelegramConfig};
pub use types::{NewSignalEvent, SignalKind};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::detector::GapDirection;
use crate::telemetry::{increment, CounterMetric};

/// Trait for signal notification implementations
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a newly detected signal
    ///
    /// Implementations own their failure handling; this call never fails
    /// from the caller's perspective.
    async fn notify(&self, event: &NewSignalEvent);
}

/// Configuration for the alert manager
#[derive(Debug, Clone)]
pub struct AlertConfig {
    /// Print alerts to stdout
    pub console_enabled: bool,
    /// Minimum time between alerts for the same signal key
    pub cooldown: Duration,
    /// Maximum retained alert records
    pub history_limit: usize,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            cooldown: Duration::from_secs(60),
            history_limit: 200,
        }
    }
}

/// A delivered alert kept in the in-memory history
#[derive(Debug, Clone)]
pub struct AlertRecord {
    pub sent_at: DateTime<Utc>,
    pub event: NewSignalEvent,
}

/// Aggregate alert counts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertStats {
    pub total: usize,
    pub fvg_alerts: usize,
    pub ifvg_alerts: usize,
    pub bullish_alerts: usize,
    pub bearish_alerts: usize,
}

#[derive(Default)]
struct AlertState {
    last_sent: HashMap<String, DateTime<Utc>>,
    history: VecDeque<AlertRecord>,
}

/// Cooldown-gated alert dispatcher across console and Telegram channels
pub struct AlertManager {
    config: AlertConfig,
    telegram: Option<TelegramChannel>,
    state: Mutex<AlertState>,
}

impl AlertManager {
    /// Create a manager with console delivery only
    pub fn new(config: AlertConfig) -> Self {
        Self {
            config,
            telegram: None,
            state: Mutex::new(AlertState::default()),
        }
    }

    /// Attach a Telegram delivery channel
    pub fn with_telegram(mut self, channel: TelegramChannel) -> Self {
        self.telegram = Some(channel);
        self
    }

    /// Recent alert records, most recent last
    pub async fn history(&self, limit: usize) -> Vec<AlertRecord> {
        let state = self.state.lock().await;
        let skip = state.history.len().saturating_sub(limit);
        state.history.iter().skip(skip).cloned().collect()
    }

    /// Counts over the retained alert history
    pub async fn stats(&self) -> AlertStats {
        let state = self.state.lock().await;
        let mut stats = AlertStats::default();
        for record in &state.history {
            stats.total += 1;
            match record.event.kind {
                SignalKind::Fvg => stats.fvg_alerts += 1,
                SignalKind::Ifvg => stats.ifvg_alerts += 1,
            }
            match record.event.direction {
                GapDirection::Bullish => stats.bullish_alerts += 1,
                GapDirection::Bearish => stats.bearish_alerts += 1,
            }
        }
        stats
    }

    fn cooldown_key(event: &NewSignalEvent) -> String {
        format!(
            "{}_{}_{}_{}",
            event.symbol, event.timeframe, event.kind, event.direction
        )
    }

    fn format_message(event: &NewSignalEvent) -> String {
        format!(
            "{} alert: {} {} {} | magnitude {:.2}% | price {:.2} | {}",
            event.kind,
            event.symbol,
            event.timeframe,
            event.direction,
            event.magnitude,
            event.price,
            event.timestamp.format("%Y-%m-%d %H:%M:%S"),
        )
    }

    /// Record the event if outside the cooldown window; true when the
    /// event should be delivered
    async fn admit(&self, event: &NewSignalEvent) -> bool {
        let key = Self::cooldown_key(event);
        let now = Utc::now();
        let mut state = self.state.lock().await;

        if let Some(last) = state.last_sent.get(&key) {
            let elapsed = (now - *last).to_std().unwrap_or(Duration::ZERO);
            if elapsed < self.config.cooldown {
                tracing::debug!(key, "Alert suppressed by cooldown");
                increment(CounterMetric::AlertsSuppressed);
                return false;
            }
        }

        state.last_sent.insert(key, now);
        state.history.push_back(AlertRecord {
            sent_at: now,
            event: event.clone(),
        });
        while state.history.len() > self.config.history_limit {
            state.history.pop_front();
        }
        true
    }
}

#[async_trait]
impl Notifier for AlertManager {
    async fn notify(&self, event: &NewSignalEvent) {
        if !self.admit(event).await {
            return;
        }

        let message = Self::format_message(event);
        increment(CounterMetric::AlertsSent);

        tracing::info!(
            symbol = %event.symbol,
            timeframe = %event.timeframe,
            kind = %event.kind,
            direction = %event.direction,
            magnitude = %event.magnitude,
            "New signal"
        );

        if self.config.console_enabled {
            println!("{message}");
        }

        if let Some(telegram) = &self.telegram {
            if let Err(e) = telegram.send(&message).await {
                tracing::error!(error = %e, "Telegram alert delivery failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bars::Timeframe;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn event(symbol: &str, kind: SignalKind, direction: GapDirection) -> NewSignalEvent {
        NewSignalEvent {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            timeframe: Timeframe::M5,
            kind,
            direction,
            magnitude: dec!(2.38),
            price: dec!(105.2),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 10, 15, 0).unwrap(),
        }
    }

    fn quiet_manager(cooldown: Duration) -> AlertManager {
        AlertManager::new(AlertConfig {
            console_enabled: false,
            cooldown,
            history_limit: 200,
        })
    }

    #[tokio::test]
    async fn test_cooldown_suppresses_duplicates() {
        let manager = quiet_manager(Duration::from_secs(60));
        let e = event("AAPL", SignalKind::Fvg, GapDirection::Bullish);

        manager.notify(&e).await;
        manager.notify(&e).await;

        assert_eq!(manager.history(10).await.len(), 1);
    }

    #[tokio::test]
    async fn test_distinct_keys_not_suppressed() {
        let manager = quiet_manager(Duration::from_secs(60));

        manager
            .notify(&event("AAPL", SignalKind::Fvg, GapDirection::Bullish))
            .await;
        manager
            .notify(&event("MSFT", SignalKind::Fvg, GapDirection::Bullish))
            .await;
        manager
            .notify(&event("AAPL", SignalKind::Ifvg, GapDirection::Bullish))
            .await;
        manager
            .notify(&event("AAPL", SignalKind::Fvg, GapDirection::Bearish))
            .await;

        assert_eq!(manager.history(10).await.len(), 4);
    }

    #[tokio::test]
    async fn test_zero_cooldown_allows_repeats() {
        let manager = quiet_manager(Duration::ZERO);
        let e = event("AAPL", SignalKind::Fvg, GapDirection::Bullish);

        manager.notify(&e).await;
        manager.notify(&e).await;

        assert_eq!(manager.history(10).await.len(), 2);
    }

    #[tokio::test]
    async fn test_stats_counts() {
        let manager = quiet_manager(Duration::from_secs(60));

        manager
            .notify(&event("AAPL", SignalKind::Fvg, GapDirection::Bullish))
            .await;
        manager
            .notify(&event("MSFT", SignalKind::Ifvg, GapDirection::Bearish))
            .await;
        manager
            .notify(&event("TSLA", SignalKind::Fvg, GapDirection::Bearish))
            .await;

        let stats = manager.stats().await;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.fvg_alerts, 2);
        assert_eq!(stats.ifvg_alerts, 1);
        assert_eq!(stats.bullish_alerts, 1);
        assert_eq!(stats.bearish_alerts, 2);
    }

    #[tokio::test]
    async fn test_history_limit_enforced() {
        let manager = AlertManager::new(AlertConfig {
            console_enabled: false,
            cooldown: Duration::ZERO,
            history_limit: 3,
        });
        let e = event("AAPL", SignalKind::Fvg, GapDirection::Bullish);

        for _ in 0..5 {
            manager.notify(&e).await;
        }

        assert_eq!(manager.history(10).await.len(), 3);
    }

    #[tokio::test]
    async fn test_history_limit_argument() {
        let manager = quiet_manager(Duration::ZERO);
        let e = event("AAPL", SignalKind::Fvg, GapDirection::Bullish);

        for _ in 0..5 {
            manager.notify(&e).await;
        }

        assert_eq!(manager.history(2).await.len(), 2);
    }

    #[test]
    fn test_cooldown_key() {
        let e = event("AAPL", SignalKind::Fvg, GapDirection::Bullish);
        assert_eq!(AlertManager::cooldown_key(&e), "AAPL_5m_FVG_Bullish");
    }

    #[test]
    fn test_format_message() {
        let e = event("AAPL", SignalKind::Fvg, GapDirection::Bullish);
        let message = AlertManager::format_message(&e);
        assert!(message.contains("FVG alert"));
        assert!(message.contains("AAPL"));
        assert!(message.contains("Bullish"));
        assert!(message.contains("2.38"));
    }
}
