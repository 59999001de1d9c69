use clap::Parser;
use fvg_scanner::cli::{Cli, Commands};
use fvg_scanner::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from {}: {}", cli.config, e);
        eprintln!("Using default configuration");
        toml::from_str(include_str!("../config.toml.example")).expect("Invalid default config")
    });

    // Configuration faults are fatal before any scan starts
    config.validate()?;

    // Initialize telemetry
    fvg_scanner::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Run(args) => {
            tracing::info!("Starting continuous scanner");
            args.execute(&config).await?;
        }
        Commands::Scan(args) => {
            tracing::info!("Running single scan");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Symbols: {}", config.scanner.symbols.join(", "));
            println!(
                "  Timeframes: {}",
                config
                    .scanner
                    .timeframes
                    .iter()
                    .map(|tf| tf.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            println!("  Interval: {}s", config.scanner.scan_interval_secs);
            println!("  Threshold: {}", config.detector.threshold);
            println!(
                "  Alerts: console={} telegram={}",
                config.alerts.console_enabled, config.alerts.telegram_enabled
            );
        }
    }

    Ok(())
}
