//! # herald-telegram
//!
//! Telegram transport for herald: [`TelegramBotAdapter`] implements [`herald_core::Bot`] on top
//! of teloxide, retrying rate-limited and transient failures. [`register_webhook`] points
//! Telegram at the bot's HTTP endpoint on startup.

mod bot_adapter;
mod config;
mod retry;
mod webhook;

pub use bot_adapter::TelegramBotAdapter;
pub use config::TelegramConfig;
pub use retry::{with_retry, RetryPolicy};
pub use webhook::register_webhook;
