//! Outbound alerts.
//!
//! Delivery is best-effort: a notifier never returns an error to its caller
//! and never holds it longer than its own request timeout.

use crate::config::WatcherConfig;
use crate::error::WatchResult;
use crate::types::AdmittedToken;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Admission alert. Fields we do not measure are fixed placeholders.
pub fn format_admission_message(token: &AdmittedToken) -> String {
    format!(
        "CA: {mint}\n\
         ├ MC: ${mc:.2}K\n\
         ├ Replies: 0\n\
         ├ DEV:\n\
         │        Tokens: 1 | KoTH: 0 | Complete: 0\n\
         ├ Socials: X (n/a) | WEB (n/a)\n\
         ├ Volume: ?\n\
         ├ ATH: ?\n\
         ├ Bonding Curve: ?\n\
         ├ Snipers: ?\n\
         ├ Holders: ?\n\
         ├ Dev hold: 0%\n\
         └ Top 10 Holders: Σ {top10:.2}%\n\
         DEX PAID",
        mint = token.mint,
        mc = token.market_cap_usd / 1000.0,
        top10 = token.top10_percent,
    )
}

pub fn format_milestone_message(mint: &str, multiple: i64, market_cap_usd: f64) -> String {
    format!("{} reached {}x (${:.2}K MC)", mint, multiple, market_cap_usd / 1000.0)
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str);
}

/// Used when no delivery channel is configured.
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, text: &str) {
        debug!("Notification dropped (no channel configured): {}", text.lines().next().unwrap_or(""));
    }
}

/// Telegram Bot API `sendMessage` delivery.
pub struct TelegramNotifier {
    http_client: Client,
    bot_token: String,
    chat_id: String,
    timeout: Duration,
}

impl TelegramNotifier {
    pub fn new(http_client: Client, bot_token: String, chat_id: String, timeout: Duration) -> Self {
        Self {
            http_client,
            bot_token,
            chat_id,
            timeout,
        }
    }

    async fn send_message(&self, text: &str) -> WatchResult<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.bot_token);
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });

        let response = self
            .http_client
            .post(&url)
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!("Telegram rejected message with status {}", response.status());
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, text: &str) {
        if let Err(e) = self.send_message(text).await {
            warn!("Telegram delivery failed: {}", e);
        }
    }
}

/// Telegram when both credentials are configured, otherwise a no-op.
pub fn notifier_from_config(http_client: Client, config: &WatcherConfig) -> Arc<dyn Notifier> {
    match config.telegram_credentials() {
        Some((token, chat)) => {
            info!("Telegram notifications enabled for chat {}", chat);
            Arc::new(TelegramNotifier::new(
                http_client,
                token.to_string(),
                chat.to_string(),
                config.notify_timeout(),
            ))
        }
        None => {
            warn!("Telegram credentials missing; notifications are disabled");
            Arc::new(NoopNotifier)
        }
    }
}
