//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Symbols scanned successfully in the last cycle
    SuccessfulScans,
    /// Symbols that failed in the last cycle
    FailedScans,
    /// Active (unfilled) gaps across all symbols
    ActiveFvgs,
    /// Symbols with a recent gap in the last cycle
    SymbolsWithFvg,
    /// Symbols with a recent inversion in the last cycle
    SymbolsWithIfvg,
}

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Completed scan cycles
    ScansCompleted,
    /// Alerts delivered to at least one channel
    AlertsSent,
    /// Alerts dropped by the cooldown gate
    AlertsSuppressed,
}

/// Start the Prometheus exporter on the given port
pub fn install_prometheus(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!(port, "Prometheus metrics exporter listening");
    Ok(())
}

/// Record the wall-clock cost of one scan cycle
pub fn record_scan_duration(duration: Duration) {
    metrics::histogram!("fvgscan_scan_duration_seconds").record(duration.as_secs_f64());
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let name = match metric {
        GaugeMetric::SuccessfulScans => "fvgscan_successful_scans",
        GaugeMetric::FailedScans => "fvgscan_failed_scans",
        GaugeMetric::ActiveFvgs => "fvgscan_active_fvgs",
        GaugeMetric::SymbolsWithFvg => "fvgscan_symbols_with_fvg",
        GaugeMetric::SymbolsWithIfvg => "fvgscan_symbols_with_ifvg",
    };
    metrics::gauge!(name).set(value);
}

/// Increment a counter
pub fn increment(metric: CounterMetric) {
    let name = match metric {
        CounterMetric::ScansCompleted => "fvgscan_scans_completed_total",
        CounterMetric::AlertsSent => "fvgscan_alerts_sent_total",
        CounterMetric::AlertsSuppressed => "fvgscan_alerts_suppressed_total",
    };
    metrics::counter!(name).increment(1);
}
