//! CLI interface for fvg-scanner
//!
//! Provides subcommands for:
//! - `run`: start the continuous scan loop
//! - `scan`: run a single scan cycle and print a summary
//! - `config`: show the loaded configuration

mod run;
mod scan;

pub use run::RunArgs;
pub use scan::ScanArgs;

use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;

use crate::alert::{AlertManager, TelegramChannel, TelegramConfig};
use crate::config::{Config, ConfigError};
use crate::detector::FvgDetector;
use crate::feed::{YahooClient, YahooConfig};
use crate::scanner::Scanner;

#[derive(Parser, Debug)]
#[command(name = "fvg-scanner")]
#[command(about = "Multi-symbol Fair Value Gap scanner with inversion detection")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the continuous scan loop
    Run(RunArgs),
    /// Run a single scan cycle
    Scan(ScanArgs),
    /// Show the loaded configuration
    Config,
}

/// Wire a scanner from the loaded configuration
pub(crate) fn build_scanner(config: &Config) -> anyhow::Result<Scanner> {
    let source = YahooClient::with_config(YahooConfig {
        base_url: config.feed.base_url.clone(),
        timeout: Duration::from_secs(config.feed.timeout_secs),
        min_bars: config.feed.min_bars,
    })?;

    let mut alerts = AlertManager::new((&config.alerts).into());
    if config.alerts.telegram_enabled {
        let (Some(token), Some(chat_id)) = (
            config.alerts.telegram_bot_token.as_ref(),
            config.alerts.telegram_chat_id.as_ref(),
        ) else {
            return Err(ConfigError::IncompleteTelegram.into());
        };
        let channel = TelegramChannel::new(TelegramConfig::new(token.clone(), chat_id.clone()))?;
        alerts = alerts.with_telegram(channel);
    }

    let detector = FvgDetector::new((&config.detector).into());

    Ok(Scanner::new(
        Arc::new(source),
        detector,
        Arc::new(alerts),
        (&config.scanner).into(),
    ))
}
