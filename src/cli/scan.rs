//! Single-scan command implementation

use clap::Args;

use crate::config::Config;

#[derive(Args, Debug)]
pub struct ScanArgs {}

impl ScanArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let scanner = super::build_scanner(config)?;
        let result = scanner.scan_all_symbols().await;
        let stats = result.statistics();

        println!(
            "Scan #{} finished in {:.2}s",
            result.scan_number,
            result.duration.as_secs_f64()
        );
        println!(
            "  Symbols: {} ok / {} failed",
            result.successful_scans, result.failed_scans
        );
        if !result.failed_symbols.is_empty() {
            println!("  Failed: {}", result.failed_symbols.join(", "));
        }
        println!(
            "  Recent FVGs: {}  Recent iFVGs: {}  Active FVGs: {}",
            stats.total_fvgs, stats.total_ifvgs, stats.total_active_fvgs
        );

        Ok(())
    }
}
