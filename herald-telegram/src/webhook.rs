//! Webhook registration.

use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::requests::Request;
use tracing::{info, instrument};

use crate::retry::{with_retry, RetryPolicy};

const REGISTRATION_ATTEMPTS: u32 = 5;

/// Deletes any existing webhook, then points Telegram at `url`. Each call is retried up to five
/// times, waiting out 429s.
#[instrument(skip(bot))]
pub async fn register_webhook(bot: &teloxide::Bot, url: &str) -> anyhow::Result<()> {
    let url = reqwest::Url::parse(url)?;
    let policy = RetryPolicy {
        max_attempts: REGISTRATION_ATTEMPTS,
        ..RetryPolicy::default()
    };

    with_retry("delete_webhook", policy, || bot.delete_webhook().send()).await?;
    info!("step: previous webhook removed");

    with_retry("set_webhook", policy, || {
        bot.set_webhook(url.clone())
            .allowed_updates(vec![
                teloxide::types::AllowedUpdate::Message,
                teloxide::types::AllowedUpdate::EditedMessage,
                teloxide::types::AllowedUpdate::CallbackQuery,
                teloxide::types::AllowedUpdate::MyChatMember,
                teloxide::types::AllowedUpdate::ChatMember,
            ])
            .send()
    })
    .await?;
    info!(url = %url, "Webhook registered");
    Ok(())
}
