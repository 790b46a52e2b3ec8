//! Classification of an inbound message into exactly one handling route.
//!
//! Rules are evaluated in a fixed order and the first match wins: attributed forward in a private chat,
//! social video link, explicit mention of the bot, reply to the bot, private conversation,
//! the bot joining a chat. Anything else is ignored.

use std::str::FromStr;

use herald_core::{BotContentType, BotIdentity, Chat, EntityKind, Message};

/// URL fragments of short-video links the bot downloads.
pub const VIDEO_LINK_FRAGMENTS: &[&str] = &[
    "instagram.com/reel",
    "facebook.com/share/r",
    "vt.tiktok.com",
    "facebook.com/reel/",
    "facebook.com/share/v/",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ForwardTranslate,
    VideoDownload { url: String },
    /// `remainder` is the trimmed text after the mention entity.
    MentionCommand { remainder: String },
    ReplyContinuation,
    PrivateConversation,
    Welcome,
    Ignore { reason: &'static str },
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ForwardTranslate => "forward_translate",
            Self::VideoDownload { .. } => "video_download",
            Self::MentionCommand { .. } => "mention_command",
            Self::ReplyContinuation => "reply_continuation",
            Self::PrivateConversation => "private_conversation",
            Self::Welcome => "welcome",
            Self::Ignore { .. } => "ignore",
        }
    }

    /// Routes that cost money (downloads, generation) and are gated in private chats.
    pub fn requires_permission(&self) -> bool {
        matches!(
            self,
            Self::VideoDownload { .. }
                | Self::MentionCommand { .. }
                | Self::ReplyContinuation
                | Self::PrivateConversation
        )
    }
}

/// Group and supergroup members are always allowed; in any other chat only the owner is.
pub fn is_permitted(chat: &Chat, user_id: i64, owner_id: i64) -> bool {
    chat.kind.is_group() || (owner_id != 0 && user_id == owner_id)
}

/// The whitespace-separated token containing a known video link fragment.
pub fn find_video_link(text: &str) -> Option<String> {
    text.split_whitespace()
        .find(|token| {
            let lower = token.to_lowercase();
            VIDEO_LINK_FRAGMENTS.iter().any(|fragment| lower.contains(fragment))
        })
        .map(str::to_string)
}

/// Text after the first mention entity that is exactly the bot's handle.
fn mention_remainder(message: &Message, identity: &BotIdentity) -> Option<String> {
    let content = message.content()?;
    let handle = identity.mention();
    message
        .entities
        .iter()
        .filter(|entity| entity.kind == EntityKind::Mention)
        .find(|entity| {
            entity
                .slice(content)
                .is_some_and(|slice| slice.to_lowercase() == handle)
        })
        .and_then(|entity| entity.text_after(content))
        .map(|rest| rest.trim().to_string())
}

/// Classifies `message`. `replied_tag` is the stored content tag of the bot message being
/// replied to, when the reply targets this bot and the message is known.
pub fn classify(message: &Message, identity: &BotIdentity, replied_tag: Option<&str>) -> Route {
    let content = message.content().filter(|c| !c.trim().is_empty());

    let attributed_forward = message
        .forward
        .as_ref()
        .is_some_and(|origin| origin.is_attributed());
    if message.chat.is_private() && attributed_forward {
        return Route::ForwardTranslate;
    }

    if let Some(url) = content.and_then(find_video_link) {
        return Route::VideoDownload { url };
    }

    if let Some(remainder) = mention_remainder(message, identity) {
        return Route::MentionCommand { remainder };
    }

    let replies_to_bot = message
        .reply_to
        .as_ref()
        .is_some_and(|reply| reply.from_id == Some(identity.id));
    if replies_to_bot {
        let excluded = replied_tag
            .and_then(|tag| BotContentType::from_str(tag).ok())
            .is_some_and(|tag| tag.is_reply_excluded());
        if excluded {
            return Route::Ignore {
                reason: "reply to non-conversational bot message",
            };
        }
        return Route::ReplyContinuation;
    }

    if message.chat.is_private() && content.is_some() {
        return Route::PrivateConversation;
    }

    if message.new_chat_members.iter().any(|m| m.id == identity.id) {
        return Route::Welcome;
    }

    Route::Ignore {
        reason: "no rule matched",
    }
}
