//! Telemetry module
//!
//! Metrics and structured logging

mod logging;
mod metrics;

pub use logging::init_logging;
pub use metrics::{
    increment, install_prometheus, record_scan_duration, set_gauge, CounterMetric, GaugeMetric,
};

use crate::config::TelemetrySettings;

/// Initialize all telemetry subsystems
pub fn init_telemetry(config: &TelemetrySettings) -> anyhow::Result<()> {
    init_logging(&config.log_level)?;

    if let Some(port) = config.metrics_port {
        install_prometheus(port)?;
    }

    Ok(())
}
