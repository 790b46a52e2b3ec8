//! Core types: user, chat, message, handler response, and Handler trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User identity (id, username, names).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl User {
    /// First and last name joined, falling back to the username.
    pub fn display_name(&self) -> Option<String> {
        let parts: Vec<&str> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect();
        if parts.is_empty() {
            self.username.clone()
        } else {
            Some(parts.join(" "))
        }
    }
}

/// Chat type as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    /// Parses the platform's `type` string; unknown values are treated as private.
    pub fn parse(kind: &str) -> Self {
        match kind {
            "group" => Self::Group,
            "supergroup" => Self::Supergroup,
            "channel" => Self::Channel,
            _ => Self::Private,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group | Self::Supergroup)
    }
}

/// Chat (private, group or channel) identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub kind: ChatKind,
    pub title: Option<String>,
    pub username: Option<String>,
}

impl Chat {
    pub fn is_private(&self) -> bool {
        self.kind == ChatKind::Private
    }
}

/// The bot's own account, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotIdentity {
    pub id: i64,
    /// Handle without the leading `@`.
    pub username: String,
}

impl BotIdentity {
    pub fn new(id: i64, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into().trim_start_matches('@').to_string(),
        }
    }

    /// `@handle`, lowercased, as it appears in a mention entity.
    pub fn mention(&self) -> String {
        format!("@{}", self.username.to_lowercase())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Mention,
    TextMention,
    Url,
    BotCommand,
    Other,
}

/// Formatting entity. `offset` and `length` are UTF-16 code units, as the platform sends them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntity {
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

impl MessageEntity {
    /// The exact text covered by this entity, or `None` when the offsets do not fit `text`.
    pub fn slice<'a>(&self, text: &'a str) -> Option<&'a str> {
        let start = utf16_to_byte_index(text, self.offset)?;
        let end = utf16_to_byte_index(text, self.end()?)?;
        text.get(start..end)
    }

    /// Everything after the entity.
    pub fn text_after<'a>(&self, text: &'a str) -> Option<&'a str> {
        let end = utf16_to_byte_index(text, self.end()?)?;
        text.get(end..)
    }

    fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.length)
    }
}

/// Maps a UTF-16 offset to a byte index; `None` if it is out of range or splits a character.
fn utf16_to_byte_index(text: &str, units: usize) -> Option<usize> {
    let mut count = 0;
    for (idx, ch) in text.char_indices() {
        if count == units {
            return Some(idx);
        }
        count += ch.len_utf16();
        if count > units {
            return None;
        }
    }
    (count == units).then_some(text.len())
}

/// Where a forwarded message originally came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForwardOrigin {
    /// A user whose profile is visible.
    User(User),
    /// A user who hides their account; only a display name is known.
    HiddenUser { name: String },
    /// A channel or group.
    Chat {
        title: Option<String>,
        username: Option<String>,
        is_channel: bool,
        message_id: Option<i64>,
    },
}

impl ForwardOrigin {
    /// True when the source chat or user is known; hidden-user forwards carry only a name.
    pub fn is_attributed(&self) -> bool {
        !matches!(self, ForwardOrigin::HiddenUser { .. })
    }
}

/// The message this one replies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyContext {
    pub message_id: i64,
    pub from_id: Option<i64>,
    pub from_is_bot: bool,
    pub text: Option<String>,
}

/// Media attached to a message; file ids are reusable for re-sending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Media {
    Photo { file_id: String },
    Video { file_id: String },
}

/// A single inbound message with everything routing needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub user: User,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    /// Entities of `text`, or of `caption` when the message has no text.
    pub entities: Vec<MessageEntity>,
    pub forward: Option<ForwardOrigin>,
    pub reply_to: Option<ReplyContext>,
    pub media: Option<Media>,
    pub new_chat_members: Vec<User>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Text, or caption when there is no text.
    pub fn content(&self) -> Option<&str> {
        self.text.as_deref().or(self.caption.as_deref())
    }
}

/// Handler result for the chain. `Reply(text)` carries the response body so later handlers can use it in `after()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Stop the chain; no response body.
    Stop,
    /// Skip this handler, try next.
    Ignore,
    /// Stop the chain and attach reply text.
    Reply(String),
}

/// Converts a transport-specific user type to core [`User`].
pub trait ToCoreUser: Send + Sync {
    fn to_core(&self) -> User;
}

/// Converts a transport-specific message type to core [`Message`].
pub trait ToCoreMessage: Send + Sync {
    fn to_core(&self) -> Message;
}

/// Single handler concept: optional before / handle / after. Chain runs all before → handle until Stop/Reply → all after (reverse).
#[async_trait]
pub trait Handler: Send + Sync {
    /// Runs before the handle phase. Return false to stop the chain.
    async fn before(&self, _message: &Message) -> crate::error::Result<bool> {
        Ok(true)
    }
    /// Processes the message. Return Stop or Reply to end the handle phase. Default: Continue.
    async fn handle(&self, _message: &Message) -> crate::error::Result<HandlerResponse> {
        Ok(HandlerResponse::Continue)
    }
    /// Runs after the handle phase (reverse order), with the final response.
    async fn after(
        &self,
        _message: &Message,
        _response: &HandlerResponse,
    ) -> crate::error::Result<()> {
        Ok(())
    }
}
