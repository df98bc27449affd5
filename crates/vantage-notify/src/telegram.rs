//! Telegram notifier, grounded on `original_source/src/notifications/telegram.py`.
//!
//! Follows `vantage-broker-live::Trading212Broker`'s reqwest-adapter shape: one
//! shared `reqwest::Client`, `.context(...)`-wrapped errors, no retry logic — a
//! failed send is the caller's problem, not this adapter's (§4.7 "Notifier boundary").

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::Notifier;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    http: reqwest::Client,
    bot_token: Option<String>,
    chat_id: Option<String>,
    enabled: bool,
}

impl TelegramNotifier {
    pub fn new(enabled: bool, bot_token: Option<String>, chat_id: Option<String>) -> Self {
        TelegramNotifier { http: reqwest::Client::new(), bot_token, chat_id, enabled }
    }

    fn is_configured(&self) -> bool {
        self.enabled && self.bot_token.is_some() && self.chat_id.is_some()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let (Some(bot_token), Some(chat_id)) = (self.bot_token.as_ref(), self.chat_id.as_ref()) else {
            tracing::debug!("telegram notifier disabled or unconfigured, skipping send");
            return Ok(());
        };
        if !self.is_configured() {
            tracing::debug!("telegram notifier disabled, skipping send");
            return Ok(());
        }

        let url = format!("{TELEGRAM_API_BASE}/bot{bot_token}/sendMessage");
        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        self.http
            .post(&url)
            .json(&payload)
            .timeout(std::time::Duration::from_secs(10))
            .send()
            .await
            .context("telegram sendMessage request failed")?
            .error_for_status()
            .context("telegram rejected the message")?;
        Ok(())
    }
}
