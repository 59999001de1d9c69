//! Run command implementation

use clap::Args;
use std::sync::Arc;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the scan interval in seconds
    #[arg(long)]
    pub interval: Option<u64>,
}

impl RunArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let mut config = config.clone();
        if let Some(interval) = self.interval {
            config.scanner.scan_interval_secs = interval;
        }

        let scanner = Arc::new(super::build_scanner(&config)?);

        let loop_scanner = scanner.clone();
        let handle = tokio::spawn(async move { loop_scanner.run().await });

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutdown requested, stopping scan loop");
        scanner.stop();
        handle.await?;

        if let Some(result) = scanner.latest().await {
            let stats = result.statistics();
            tracing::info!(
                scans = result.scan_number,
                symbols_with_fvg = stats.symbols_with_fvg,
                symbols_with_ifvg = stats.symbols_with_ifvg,
                "Scanner stopped"
            );
        }

        Ok(())
    }
}
