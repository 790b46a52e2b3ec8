//! Tags attached to every message the bot sends.
//!
//! The tag is persisted next to the message so later replies can be routed by what the bot said.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// What kind of content a bot-sent message carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BotContentType {
    NewsForwardVideo,
    NewsForwardPhoto,
    NewsForwardText,
    TranslationConfirmation,
    TranslationError,
    NoContentForward,
    AiSummary,
    SummaryError,
    DailyReport,
    ReportError,
    RandomFact,
    HistoryFact,
    FactError,
    SwearCounter,
    WordcloudImage,
    WordcloudNoData,
    VideoUpload,
    VideoTooLarge,
    VideoDownloadError,
    VideoProcessingError,
    VideoLinkError,
    ExpertOpinion,
    ExpertError,
    ExpertNoQuery,
    AnnouncementScheduled,
    AnnouncementFormatError,
    ScheduledAnnouncement,
    WelcomeMessage,
    PermissionDenied,
    CashbackReminder,
    MonthlyPaymentsReminder,
    ReminderError,
}

impl BotContentType {
    pub const ALL: [BotContentType; 32] = [
        Self::NewsForwardVideo,
        Self::NewsForwardPhoto,
        Self::NewsForwardText,
        Self::TranslationConfirmation,
        Self::TranslationError,
        Self::NoContentForward,
        Self::AiSummary,
        Self::SummaryError,
        Self::DailyReport,
        Self::ReportError,
        Self::RandomFact,
        Self::HistoryFact,
        Self::FactError,
        Self::SwearCounter,
        Self::WordcloudImage,
        Self::WordcloudNoData,
        Self::VideoUpload,
        Self::VideoTooLarge,
        Self::VideoDownloadError,
        Self::VideoProcessingError,
        Self::VideoLinkError,
        Self::ExpertOpinion,
        Self::ExpertError,
        Self::ExpertNoQuery,
        Self::AnnouncementScheduled,
        Self::AnnouncementFormatError,
        Self::ScheduledAnnouncement,
        Self::WelcomeMessage,
        Self::PermissionDenied,
        Self::CashbackReminder,
        Self::MonthlyPaymentsReminder,
        Self::ReminderError,
    ];

    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewsForwardVideo => "news_forward_video",
            Self::NewsForwardPhoto => "news_forward_photo",
            Self::NewsForwardText => "news_forward_text",
            Self::TranslationConfirmation => "translation_confirmation",
            Self::TranslationError => "translation_error",
            Self::NoContentForward => "no_content_forward",
            Self::AiSummary => "ai_summary",
            Self::SummaryError => "summary_error",
            Self::DailyReport => "daily_report",
            Self::ReportError => "report_error",
            Self::RandomFact => "random_fact",
            Self::HistoryFact => "history_fact",
            Self::FactError => "fact_error",
            Self::SwearCounter => "swear_counter",
            Self::WordcloudImage => "wordcloud_image",
            Self::WordcloudNoData => "wordcloud_no_data",
            Self::VideoUpload => "video_upload",
            Self::VideoTooLarge => "video_too_large",
            Self::VideoDownloadError => "video_download_error",
            Self::VideoProcessingError => "video_processing_error",
            Self::VideoLinkError => "video_link_error",
            Self::ExpertOpinion => "expert_opinion",
            Self::ExpertError => "expert_error",
            Self::ExpertNoQuery => "expert_no_query",
            Self::AnnouncementScheduled => "announcement_scheduled",
            Self::AnnouncementFormatError => "announcement_format_error",
            Self::ScheduledAnnouncement => "scheduled_announcement",
            Self::WelcomeMessage => "welcome_message",
            Self::PermissionDenied => "permission_denied",
            Self::CashbackReminder => "cashback_reminder",
            Self::MonthlyPaymentsReminder => "monthly_payments_reminder",
            Self::ReminderError => "reminder_error",
        }
    }

    /// Replies to messages with these tags never start a new AI conversation.
    ///
    /// Only conversational output (expert answers) and operator announcements invite a follow-up.
    pub fn is_reply_excluded(&self) -> bool {
        !matches!(self, Self::ExpertOpinion | Self::ScheduledAnnouncement)
    }
}

impl fmt::Display for BotContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BotContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown bot content type: {}", s))
    }
}
