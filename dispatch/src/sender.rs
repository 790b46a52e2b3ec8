//! Sender that persists everything the bot sends.

use std::sync::Arc;

use herald_core::{
    Bot, BotContentType, BotIdentity, ChatAction, OutgoingContent, Result, TextFormat,
};
use storage::{MessageRecord, MessageRepository};
use tracing::{debug, warn};

/// Wraps a [`Bot`]: every sent message is upserted with `is_bot = true` and its content tag,
/// so replies to it can later be classified by tag.
#[derive(Clone)]
pub struct RecordingSender {
    bot: Arc<dyn Bot>,
    messages: MessageRepository,
    identity: BotIdentity,
}

impl RecordingSender {
    pub fn new(bot: Arc<dyn Bot>, messages: MessageRepository, identity: BotIdentity) -> Self {
        Self {
            bot,
            messages,
            identity,
        }
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    /// Sends `content` and records it. A failed record is logged; the send still counts.
    pub async fn send(
        &self,
        chat_id: i64,
        content: OutgoingContent,
        format: TextFormat,
        reply_to: Option<i64>,
        tag: Option<BotContentType>,
    ) -> Result<i64> {
        let text = content.text().map(str::to_string);
        let message_id = self.bot.send(chat_id, content, format, reply_to).await?;

        let record = MessageRecord::new(
            message_id,
            chat_id,
            self.identity.id,
            Some(self.identity.username.clone()),
            text,
        )
        .from_bot(tag.map(|t| t.as_str()));
        if let Err(e) = self.messages.upsert(&record).await {
            warn!(error = %e, chat_id, message_id, "Failed to record sent message");
        }

        debug!(chat_id, message_id, tag = ?tag, "Sent and recorded bot message");
        Ok(message_id)
    }

    /// MarkdownV2 text, the common case for bot output.
    pub async fn send_markdown(
        &self,
        chat_id: i64,
        text: impl Into<String>,
        tag: BotContentType,
        reply_to: Option<i64>,
    ) -> Result<i64> {
        self.send(
            chat_id,
            OutgoingContent::Text(text.into()),
            TextFormat::MarkdownV2,
            reply_to,
            Some(tag),
        )
        .await
    }

    /// Best effort; a failed chat action is only logged.
    pub async fn chat_action(&self, chat_id: i64, action: ChatAction) {
        if let Err(e) = self.bot.send_chat_action(chat_id, action).await {
            debug!(error = %e, chat_id, "Chat action failed");
        }
    }
}
