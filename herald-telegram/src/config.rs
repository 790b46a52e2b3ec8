//! Telegram connection settings: token and optional API URL override.

use anyhow::{Context, Result};
use std::env;

pub struct TelegramConfig {
    pub bot_token: String,
    pub api_url: Option<String>,
}

impl TelegramConfig {
    /// `BOT_TOKEN` (or `TELEGRAM_BOT_TOKEN`) is required; `TELEGRAM_API_URL` is optional.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN")
            .or_else(|_| env::var("TELEGRAM_BOT_TOKEN"))
            .map_err(|_| anyhow::anyhow!("BOT_TOKEN not set"))?;
        let api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        Ok(Self { bot_token, api_url })
    }

    pub fn with_token(bot_token: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            api_url: None,
        }
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = Some(api_url.into());
        self
    }

    /// Builds the teloxide client, pointing it at `api_url` when set.
    pub fn build_bot(&self) -> Result<teloxide::Bot> {
        let bot = teloxide::Bot::new(&self.bot_token);
        match &self.api_url {
            Some(url) => {
                let url = reqwest::Url::parse(url)
                    .with_context(|| format!("Invalid TELEGRAM_API_URL: {}", url))?;
                Ok(bot.set_api_url(url))
            }
            None => Ok(bot),
        }
    }
}
