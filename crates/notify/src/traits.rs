//! Notifier trait definition and shared error types.

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
}

/// A composed report ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    /// Short label for the report (used in logs, not sent to Telegram).
    pub subject: String,
    /// The full report text.
    pub body: String,
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g., "telegram").
    fn channel_name(&self) -> &str;
}
