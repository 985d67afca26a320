//! Telegram Bot API notifier.
//!
//! Delivers the composed report via the Telegram Bot API `sendMessage`
//! endpoint as a `{chat_id, text}` JSON payload. Delivery failures are
//! always surfaced: a non-success response propagates the API's error
//! description (or the raw status and body), and HTTP 429 carries
//! Telegram's `retry_after` hint.

use crate::traits::{Notification, Notifier, NotifyError};

/// Sends report notifications via the Telegram Bot API.
#[derive(Debug)]
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

/// Build the `sendMessage` request payload.
fn build_payload(chat_id: &str, text: &str) -> serde_json::Value {
    serde_json::json!({
        "chat_id": chat_id,
        "text": text,
    })
}

impl TelegramNotifier {
    /// Creates a new `TelegramNotifier` from configuration values.
    ///
    /// Returns [`NotifyError::Config`] if the token or chat id is empty.
    pub fn new(bot_token: String, chat_id: String) -> Result<Self, NotifyError> {
        if bot_token.is_empty() {
            return Err(NotifyError::Config(
                "Telegram bot token must not be empty".to_string(),
            ));
        }
        if chat_id.is_empty() {
            return Err(NotifyError::Config(
                "Telegram chat id must not be empty".to_string(),
            ));
        }

        Ok(Self {
            bot_token,
            chat_id,
            client: reqwest::Client::new(),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramNotifier {
    /// Sends a notification via the Telegram `sendMessage` API.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let body = build_payload(&self.chat_id, &notification.body);

        tracing::debug!(
            chat_id = %self.chat_id,
            subject = %notification.subject,
            "Sending Telegram notification"
        );

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        // Read the body before judging the status so a failed read is
        // reported as its own error rather than masking the status check.
        let raw_body = response.text().await?;

        let resp_body: serde_json::Value = match serde_json::from_str(&raw_body) {
            Ok(v) => v,
            Err(_) => {
                return Err(NotifyError::Delivery(format!(
                    "Telegram returned {status}: {raw_body}"
                )));
            }
        };

        if resp_body.get("ok") == Some(&serde_json::Value::Bool(true)) {
            tracing::info!(chat_id = %self.chat_id, "Telegram notification sent");
            return Ok(());
        }

        // Handle rate limiting (HTTP 429).
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = resp_body
                .get("parameters")
                .and_then(|p| p.get("retry_after"))
                .and_then(|v| v.as_u64())
                .unwrap_or(30);
            return Err(NotifyError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        let description = resp_body
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("Unknown Telegram API error");

        tracing::warn!(
            chat_id = %self.chat_id,
            %status,
            description = %description,
            "Telegram delivery failed"
        );

        Err(NotifyError::Delivery(format!(
            "Telegram API error ({status}): {description}"
        )))
    }

    /// Returns the channel name for this notifier.
    fn channel_name(&self) -> &str {
        "telegram"
    }
}
