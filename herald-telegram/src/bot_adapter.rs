//! Wraps teloxide::Bot and implements [`herald_core::Bot`]. Production code sends through
//! Telegram; tests substitute a recording Bot.

use async_trait::async_trait;
use herald_core::{
    Bot as CoreBot, BotIdentity, ChatAction, DbotError, MediaSource, OutgoingContent, Result,
    TextFormat,
};
use teloxide::payloads::setters::*;
use teloxide::prelude::*;
use teloxide::requests::Request;
use teloxide::types::{
    ChatAction as TgChatAction, FileId, InputFile, MessageId, ParseMode, ReplyParameters,
};
use teloxide::RequestError;
use tracing::{debug, instrument};

use crate::retry::{with_retry, RetryPolicy};

pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
    retry: RetryPolicy,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self {
            bot,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }

    /// The bot's own id and handle, used for mention matching and reply lookup.
    pub async fn identity(&self) -> Result<BotIdentity> {
        let me = with_retry("get_me", self.retry, || self.bot.get_me().send())
            .await
            .map_err(map_error)?;
        Ok(BotIdentity::new(me.user.id.0 as i64, me.username()))
    }
}

fn parse_mode(format: TextFormat) -> Option<ParseMode> {
    match format {
        TextFormat::Plain => None,
        TextFormat::MarkdownV2 => Some(ParseMode::MarkdownV2),
    }
}

/// A reply that still goes out if the original was deleted meanwhile.
fn reply_parameters(reply_to: Option<i64>) -> Option<ReplyParameters> {
    reply_to.map(|id| ReplyParameters::new(MessageId(id as i32)).allow_sending_without_reply())
}

fn input_file(source: &MediaSource) -> InputFile {
    match source {
        MediaSource::FileId(id) => InputFile::file_id(FileId(id.clone())),
        MediaSource::Bytes { data, file_name } => {
            InputFile::memory(data.clone()).file_name(file_name.clone())
        }
    }
}

fn map_error(e: RequestError) -> DbotError {
    match e {
        RequestError::RetryAfter(secs) => DbotError::RateLimited(secs.duration()),
        other => DbotError::Bot(other.to_string()),
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    #[instrument(skip(self, content))]
    async fn send(
        &self,
        chat_id: i64,
        content: OutgoingContent,
        format: TextFormat,
        reply_to: Option<i64>,
    ) -> Result<i64> {
        let chat = ChatId(chat_id);
        let mode = parse_mode(format);
        let reply = reply_parameters(reply_to);

        let sent = match &content {
            OutgoingContent::Text(text) => {
                with_retry("send_message", self.retry, || {
                    let mut req = self.bot.send_message(chat, text.clone());
                    if let Some(mode) = mode {
                        req = req.parse_mode(mode);
                    }
                    if let Some(reply) = reply.clone() {
                        req = req.reply_parameters(reply);
                    }
                    req.send()
                })
                .await
            }
            OutgoingContent::Photo { source, caption } => {
                with_retry("send_photo", self.retry, || {
                    let mut req = self.bot.send_photo(chat, input_file(source));
                    if let Some(caption) = caption {
                        req = req.caption(caption.clone());
                        if let Some(mode) = mode {
                            req = req.parse_mode(mode);
                        }
                    }
                    if let Some(reply) = reply.clone() {
                        req = req.reply_parameters(reply);
                    }
                    req.send()
                })
                .await
            }
            OutgoingContent::Video { source, caption } => {
                with_retry("send_video", self.retry, || {
                    let mut req = self.bot.send_video(chat, input_file(source));
                    if let Some(caption) = caption {
                        req = req.caption(caption.clone());
                        if let Some(mode) = mode {
                            req = req.parse_mode(mode);
                        }
                    }
                    if let Some(reply) = reply.clone() {
                        req = req.reply_parameters(reply);
                    }
                    req.send()
                })
                .await
            }
        }
        .map_err(map_error)?;

        debug!(chat_id, message_id = sent.id.0, "Message sent");
        Ok(sent.id.0 as i64)
    }

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<()> {
        let action = match action {
            ChatAction::Typing => TgChatAction::Typing,
            ChatAction::UploadVideo => TgChatAction::UploadVideo,
        };
        self.bot
            .send_chat_action(ChatId(chat_id), action)
            .await
            .map_err(map_error)?;
        Ok(())
    }
}
