//! Telegram delivery channel
//!
//! Sends alert messages through the Telegram Bot API.

use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Telegram Bot API base URL
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Configuration for the Telegram channel
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Base URL for the Bot API
    pub base_url: String,
    /// Bot token issued by BotFather
    pub bot_token: String,
    /// Target chat identifier
    pub chat_id: String,
    /// Request timeout
    pub timeout: Duration,
}

impl TelegramConfig {
    /// Config for a bot token and chat id against the public API
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            base_url: TELEGRAM_API_URL.to_string(),
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Channel that delivers messages to a Telegram chat
pub struct TelegramChannel {
    config: TelegramConfig,
    client: Client,
}

impl TelegramChannel {
    /// Create a new channel with the given configuration
    pub fn new(config: TelegramConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, client })
    }

    /// Send one message to the configured chat
    pub async fn send(&self, text: &str) -> anyhow::Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.base_url, self.config.bot_token
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.config.chat_id,
                "text": text,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Telegram API error: {} - {}", status, body);
        }

        Ok(())
    }
}
