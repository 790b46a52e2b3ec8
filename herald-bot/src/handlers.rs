//! [`ChatHandlers`]: what the bot does for each routed message.
//!
//! Every failure is answered in the originating chat; only a failure to send that answer is
//! returned to the router.

use std::sync::Arc;

use async_trait::async_trait;
use dispatch::{RecordingSender, Route, RouteHandlers};
use herald_core::{
    markdown, BotContentType, ChatAction, ForwardOrigin, Media, MediaSource, Message,
    OutgoingContent, Result, TextFormat,
};
use llm_client::ContentGenerator;
use storage::{AnnouncementRepository, MessageRepository};
use tracing::{error, info, instrument, warn};

use crate::content::ContentService;
use crate::video::{VideoError, VideoFetcher};

const HISTORY_LIMIT: i64 = 10;
const MAX_CAPTION_CHARS: usize = 1024;
const SUMMARY_COMMANDS: &[&str] = &["summary", "стислийоглядвже"];
const SCHEDULE_COMMANDS: &[&str] = &["schedule", "заплануй_анонс", "заплануй анонс"];

#[derive(Debug, Clone)]
pub struct HandlerSettings {
    pub report_chat_id: i64,
    pub translate_target_language: String,
}

/// A parsed mention command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MentionCommand<'a> {
    Summary,
    Schedule { args: &'a str },
    Empty,
    Question(&'a str),
}

impl<'a> MentionCommand<'a> {
    pub fn parse(remainder: &'a str) -> Self {
        let remainder = remainder.trim();
        if remainder.is_empty() {
            return Self::Empty;
        }
        if SUMMARY_COMMANDS
            .iter()
            .any(|c| remainder.to_lowercase() == *c)
        {
            return Self::Summary;
        }
        if let Some(args) = SCHEDULE_COMMANDS
            .iter()
            .find_map(|c| strip_command(remainder, c))
        {
            return Self::Schedule { args };
        }
        Self::Question(remainder)
    }
}

/// The text after `command` when `text` starts with it (case-insensitive) as a whole word.
fn strip_command<'a>(text: &'a str, command: &str) -> Option<&'a str> {
    let len = command.chars().count();
    let end = text
        .char_indices()
        .nth(len)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    let head = text.get(..end)?;
    if head.chars().count() != len || head.to_lowercase() != command {
        return None;
    }
    let rest = &text[end..];
    (rest.is_empty() || rest.starts_with(char::is_whitespace)).then(|| rest.trim())
}

/// Label for where a forwarded message came from, as MarkdownV2; public channel posts link back.
pub fn forward_source(origin: &ForwardOrigin) -> String {
    match origin {
        ForwardOrigin::Chat {
            title,
            username,
            is_channel,
            message_id,
        } => {
            let name = title.as_deref().unwrap_or("a private channel or group");
            match (is_channel, username, message_id) {
                (true, Some(username), Some(id)) => {
                    markdown::link(&format!("https://t.me/{}/{}", username, id), name)
                }
                _ => markdown::escape(name),
            }
        }
        ForwardOrigin::User(user) => markdown::escape(&format!(
            "user {}",
            user.display_name().as_deref().unwrap_or("unknown")
        )),
        ForwardOrigin::HiddenUser { name } => markdown::escape(&format!("user {}", name)),
    }
}

pub struct ChatHandlers {
    sender: RecordingSender,
    content: Arc<ContentService>,
    generator: Arc<dyn ContentGenerator>,
    messages: MessageRepository,
    announcements: AnnouncementRepository,
    video: Arc<dyn VideoFetcher>,
    settings: HandlerSettings,
}

impl ChatHandlers {
    pub fn new(
        sender: RecordingSender,
        content: Arc<ContentService>,
        generator: Arc<dyn ContentGenerator>,
        messages: MessageRepository,
        announcements: AnnouncementRepository,
        video: Arc<dyn VideoFetcher>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            sender,
            content,
            generator,
            messages,
            announcements,
            video,
            settings,
        }
    }

    async fn reply(&self, message: &Message, text: String, tag: BotContentType) -> Result<()> {
        self.sender
            .send_markdown(message.chat.id, text, tag, Some(message.id))
            .await
            .map(|_| ())
    }

    /// Answers `question` as the chat's expert, with the recent chat history as context.
    #[instrument(skip(self, message, question), fields(chat_id = message.chat.id))]
    async fn expert_answer(&self, message: &Message, question: &str) -> Result<()> {
        self.sender.chat_action(message.chat.id, ChatAction::Typing).await;

        let history = match self
            .messages
            .get_recent_messages(message.chat.id, HISTORY_LIMIT + 1)
            .await
        {
            Ok(records) => records
                .iter()
                .filter(|r| r.telegram_message_id != message.id)
                .filter_map(|r| {
                    r.message
                        .as_deref()
                        .map(|text| prompt::history_turn(r.is_bot, r.username.as_deref(), text))
                })
                .collect::<Vec<_>>(),
            Err(e) => {
                warn!(error = %e, "Chat history unavailable, answering without context");
                Vec::new()
            }
        };
        let skip = history.len().saturating_sub(HISTORY_LIMIT as usize);
        let history = history.into_iter().skip(skip).collect();

        match self.generator.expert_answer(history, question).await {
            Ok(answer) => {
                let text = format!(
                    "🧑‍🏫 {}\n\n{}",
                    markdown::bold("Here is the expert opinion on this:"),
                    markdown::escape(&answer)
                );
                self.reply(message, text, BotContentType::ExpertOpinion).await
            }
            Err(e) => {
                error!(error = %e, "Expert answer failed");
                let text = format!(
                    "The expert is unavailable right now\\: {}",
                    markdown::escape(&e.to_string())
                );
                self.reply(message, text, BotContentType::ExpertError).await
            }
        }
    }

    async fn schedule(&self, message: &Message, args: &str) -> Result<()> {
        let parsed = args
            .split_once(char::is_whitespace)
            .and_then(|(time, text)| {
                let text = text.trim();
                let time = scheduler::parse_time_of_day(time)?;
                (!text.is_empty()).then_some((time, text))
            });
        let Some((time, text)) = parsed else {
            let handle = format!("@{}", self.sender.identity().username);
            let usage = format!(
                "Invalid command format\\.\nUse\\: `{handle} schedule HH:MM announcement text`\nor\\: `{handle} заплануй_анонс HH:MM announcement text`\\.",
                handle = handle
            );
            return self
                .reply(message, usage, BotContentType::AnnouncementFormatError)
                .await;
        };

        match scheduler::schedule_announcement(
            &self.announcements,
            self.settings.report_chat_id,
            time,
            &markdown::escape(text),
            self.content.now(),
        )
        .await
        {
            Ok(announcement) => {
                info!(id = announcement.id, fire_at = %announcement.schedule_at, "Announcement scheduled");
                let text = format!(
                    "Announcement scheduled for {} at {}\\. Announcement ID\\: `{}`",
                    markdown::bold(&announcement.schedule_at.format("%d.%m.%Y").to_string()),
                    markdown::bold(&announcement.schedule_at.format("%H:%M UTC").to_string()),
                    announcement.id
                );
                self.reply(message, text, BotContentType::AnnouncementScheduled)
                    .await
            }
            Err(e) => {
                error!(error = %e, "Failed to store announcement");
                let text = format!(
                    "Could not schedule the announcement\\: {}",
                    markdown::escape(&e.to_string())
                );
                self.reply(message, text, BotContentType::AnnouncementFormatError)
                    .await
            }
        }
    }
}

#[async_trait]
impl RouteHandlers for ChatHandlers {
    #[instrument(skip(self, message), fields(chat_id = message.chat.id))]
    async fn forward_translate(&self, message: &Message) -> Result<()> {
        let source = message
            .forward
            .as_ref()
            .map(forward_source)
            .unwrap_or_else(|| markdown::escape("an unknown source"));
        let forwarder = markdown::escape(message.user.username.as_deref().unwrap_or("unknown user"));
        let content = message.content().filter(|c| !c.trim().is_empty());

        if content.is_none() && message.media.is_none() {
            return self
                .reply(
                    message,
                    "Received a forwarded message without text or media\\. Nothing to translate or forward\\."
                        .to_string(),
                    BotContentType::NoContentForward,
                )
                .await;
        }

        let translation = match content {
            Some(text) => {
                self.sender.chat_action(message.chat.id, ChatAction::Typing).await;
                match self
                    .generator
                    .translate(text, &self.settings.translate_target_language)
                    .await
                {
                    Ok(translated) => translated,
                    Err(e) => {
                        error!(error = %e, "Translation failed");
                        let text = format!(
                            "Something went wrong while translating the news\\: {}\\. Please try again\\.",
                            markdown::escape(&e.to_string())
                        );
                        return self.reply(message, text, BotContentType::TranslationError).await;
                    }
                }
            }
            None => String::new(),
        };

        let caption = markdown::truncate_escaped(
            &format!(
                "📤 News forwarded from {} \\(by {}\\)\\:\n\n{}",
                source,
                forwarder,
                markdown::escape(&translation)
            ),
            MAX_CAPTION_CHARS,
        );
        let (outgoing, tag, what) = match &message.media {
            Some(Media::Video { file_id }) => (
                OutgoingContent::Video {
                    source: MediaSource::FileId(file_id.clone()),
                    caption: Some(caption),
                },
                BotContentType::NewsForwardVideo,
                " \\(with video\\)",
            ),
            Some(Media::Photo { file_id }) => (
                OutgoingContent::Photo {
                    source: MediaSource::FileId(file_id.clone()),
                    caption: Some(caption),
                },
                BotContentType::NewsForwardPhoto,
                " \\(with image\\)",
            ),
            None => (
                OutgoingContent::Text(caption),
                BotContentType::NewsForwardText,
                "",
            ),
        };

        match self
            .sender
            .send(
                self.settings.report_chat_id,
                outgoing,
                TextFormat::MarkdownV2,
                None,
                Some(tag),
            )
            .await
        {
            Ok(_) => {
                info!(tag = %tag, report_chat_id = self.settings.report_chat_id, "News forwarded");
                let text = format!(
                    "🔄 The translated news{} was sent to the group\\. Thank you\\!",
                    what
                );
                self.reply(message, text, BotContentType::TranslationConfirmation)
                    .await
            }
            Err(e) => {
                error!(error = %e, "Forwarding to the group failed");
                let text = format!(
                    "Something went wrong while forwarding the news\\: {}\\. Please try again\\.",
                    markdown::escape(&e.to_string())
                );
                self.reply(message, text, BotContentType::TranslationError).await
            }
        }
    }

    #[instrument(skip(self, message), fields(chat_id = message.chat.id))]
    async fn download_video(&self, message: &Message, url: &str) -> Result<()> {
        self.sender
            .chat_action(message.chat.id, ChatAction::UploadVideo)
            .await;

        let data = match self.video.fetch(url).await {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Video fetch failed");
                let (text, tag) = match &e {
                    VideoError::TooLarge { size_mb } => (
                        format!(
                            "The video is too large \\({} MB\\), I can't send it\\. Max\\. 50 MB\\.",
                            markdown::escape(&format!("{:.2}", size_mb))
                        ),
                        BotContentType::VideoTooLarge,
                    ),
                    VideoError::Download(reason) => (
                        format!(
                            "Failed to download the video\\: {}\\. Check the link or try again later\\.",
                            markdown::escape(reason)
                        ),
                        BotContentType::VideoDownloadError,
                    ),
                    VideoError::Resolve(_) | VideoError::NoVideo => (
                        "Could not process the video link\\. Try another one\\.".to_string(),
                        BotContentType::VideoLinkError,
                    ),
                };
                return self.reply(message, text, tag).await;
            }
        };

        let upload = self
            .sender
            .send(
                message.chat.id,
                OutgoingContent::Video {
                    source: MediaSource::Bytes {
                        data,
                        file_name: "video.mp4".to_string(),
                    },
                    caption: None,
                },
                TextFormat::MarkdownV2,
                Some(message.id),
                Some(BotContentType::VideoUpload),
            )
            .await;
        if let Err(e) = upload {
            error!(error = %e, "Video upload failed");
            return self
                .reply(
                    message,
                    "An unexpected error occurred while processing the video\\.".to_string(),
                    BotContentType::VideoProcessingError,
                )
                .await;
        }
        Ok(())
    }

    #[instrument(skip(self, message, remainder), fields(chat_id = message.chat.id))]
    async fn mention_command(&self, message: &Message, remainder: &str) -> Result<()> {
        match MentionCommand::parse(remainder) {
            MentionCommand::Summary => {
                self.sender.chat_action(message.chat.id, ChatAction::Typing).await;
                // Failures are already reported in the chat.
                let _ = self
                    .content
                    .ai_summary(message.chat.id, Some(message.id))
                    .await;
                Ok(())
            }
            MentionCommand::Schedule { args } => self.schedule(message, args).await,
            MentionCommand::Empty => {
                let text = format!(
                    "Ask me something after the mention, for example\\: `@{} what should we cook tonight?`",
                    self.sender.identity().username
                );
                self.reply(message, text, BotContentType::ExpertNoQuery).await
            }
            MentionCommand::Question(question) => self.expert_answer(message, question).await,
        }
    }

    async fn continue_reply(&self, message: &Message) -> Result<()> {
        match message.content().filter(|c| !c.trim().is_empty()) {
            Some(question) => self.expert_answer(message, question).await,
            None => Ok(()),
        }
    }

    async fn private_conversation(&self, message: &Message) -> Result<()> {
        match message.content().filter(|c| !c.trim().is_empty()) {
            Some(question) => self.expert_answer(message, question).await,
            None => Ok(()),
        }
    }

    async fn welcome(&self, message: &Message) -> Result<()> {
        let handle = markdown::escape(&format!("@{}", self.sender.identity().username));
        let text = format!(
            "Hi\\! I'm your assistant in this chat\\. Here is what I do\\:\n\n\
             • {morning}\\: news, weather and exchange rates every morning\\.\n\
             • {evening}\\: the day's statistics and the most active members\\.\n\
             • {summary}\\: a short summary of the day's discussions\\.\n\
             • {video}\\: send a Facebook, Instagram or TikTok link and I'll fetch the video\\.\n\
             • {expert}\\: mention {handle} with a question and I'll answer it\\.\n\
             • {news}\\: forward me a post from any public channel in private and I'll translate it for the group\\.\n\
             • {swear}\\: I know who the most polite person here is\\.\\.\\.\n",
            morning = markdown::bold("Morning report"),
            evening = markdown::bold("Evening report"),
            summary = markdown::bold("AI summary"),
            video = markdown::bold("Video downloads"),
            expert = markdown::bold("Expert answers"),
            news = markdown::bold("News translation"),
            swear = markdown::bold("Profanity counter"),
            handle = handle,
        );
        self.reply(message, text, BotContentType::WelcomeMessage).await
    }

    async fn refuse(&self, message: &Message, route: &Route) -> Result<()> {
        let text = match route {
            Route::VideoDownload { .. } => {
                "Sorry, video downloads are only available in group chats or in the owner's private chat\\."
            }
            _ => {
                "Sorry, I don't answer questions from other users in private chats\\. My expertise is reserved for the group\\."
            }
        };
        self.reply(message, text.to_string(), BotContentType::PermissionDenied)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::User;

    #[test]
    fn test_mention_command_parse() {
        assert_eq!(MentionCommand::parse("   "), MentionCommand::Empty);
        assert_eq!(MentionCommand::parse("Summary"), MentionCommand::Summary);
        assert_eq!(MentionCommand::parse("СтислийОглядВже"), MentionCommand::Summary);
        assert_eq!(
            MentionCommand::parse("schedule 18:00 Pizza night"),
            MentionCommand::Schedule {
                args: "18:00 Pizza night"
            }
        );
        assert_eq!(
            MentionCommand::parse("Заплануй анонс 9:30 Збори"),
            MentionCommand::Schedule { args: "9:30 Збори" }
        );
        assert_eq!(
            MentionCommand::parse("заплануй_анонс"),
            MentionCommand::Schedule { args: "" }
        );
        assert_eq!(
            MentionCommand::parse("schedules are hard?"),
            MentionCommand::Question("schedules are hard?")
        );
    }

    #[test]
    fn test_forward_source_labels() {
        let channel = ForwardOrigin::Chat {
            title: Some("Daily News".to_string()),
            username: Some("dailynews".to_string()),
            is_channel: true,
            message_id: Some(15),
        };
        assert_eq!(
            forward_source(&channel),
            "[Daily News](https://t.me/dailynews/15)"
        );

        let private_group = ForwardOrigin::Chat {
            title: None,
            username: None,
            is_channel: false,
            message_id: None,
        };
        assert_eq!(forward_source(&private_group), "a private channel or group");

        let user = ForwardOrigin::User(User {
            id: 3,
            first_name: Some("Lesya".to_string()),
            last_name: Some("Ukrainka".to_string()),
            ..Default::default()
        });
        assert_eq!(forward_source(&user), "user Lesya Ukrainka");
    }
}
