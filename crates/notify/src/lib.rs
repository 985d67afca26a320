//! Report delivery channels.
//!
//! This crate provides:
//! - `Notifier` trait for pluggable delivery channels
//! - The Telegram Bot API implementation used by the report job

pub mod telegram;
pub mod traits;

pub use telegram::TelegramNotifier;
pub use traits::{Notification, Notifier, NotifyError};
