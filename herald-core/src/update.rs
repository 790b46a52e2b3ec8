//! Webhook update decoding.
//!
//! The platform posts JSON updates; these types accept any subset of fields so that partial or
//! newer payloads still decode. [`WireMessage`] converts to the core [`Message`] via [`ToCoreMessage`].

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::types::{
    Chat, ChatKind, EntityKind, ForwardOrigin, Media, Message, MessageEntity, ReplyContext,
    ToCoreMessage, ToCoreUser, User,
};

/// One inbound update. Only `message` is routed; other kinds are logged.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: Option<i64>,
    pub message: Option<WireMessage>,
    pub edited_message: Option<Value>,
    pub channel_post: Option<Value>,
    pub callback_query: Option<Value>,
    pub my_chat_member: Option<Value>,
    pub chat_member: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateKind {
    Message,
    EditedMessage,
    ChannelPost,
    CallbackQuery,
    MyChatMember,
    ChatMember,
    Other,
}

impl UpdateKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::EditedMessage => "edited_message",
            Self::ChannelPost => "channel_post",
            Self::CallbackQuery => "callback_query",
            Self::MyChatMember => "my_chat_member",
            Self::ChatMember => "chat_member",
            Self::Other => "other",
        }
    }
}

impl Update {
    pub fn kind(&self) -> UpdateKind {
        if self.message.is_some() {
            UpdateKind::Message
        } else if self.edited_message.is_some() {
            UpdateKind::EditedMessage
        } else if self.channel_post.is_some() {
            UpdateKind::ChannelPost
        } else if self.callback_query.is_some() {
            UpdateKind::CallbackQuery
        } else if self.my_chat_member.is_some() {
            UpdateKind::MyChatMember
        } else if self.chat_member.is_some() {
            UpdateKind::ChatMember
        } else {
            UpdateKind::Other
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl ToCoreUser for WireUser {
    fn to_core(&self) -> User {
        User {
            id: self.id,
            is_bot: self.is_bot,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireChat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

impl WireChat {
    fn to_core(&self) -> Chat {
        Chat {
            id: self.id,
            kind: ChatKind::parse(&self.kind),
            title: self.title.clone(),
            username: self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
}

impl WireEntity {
    fn to_core(&self) -> MessageEntity {
        let kind = match self.kind.as_str() {
            "mention" => EntityKind::Mention,
            "text_mention" => EntityKind::TextMention,
            "url" => EntityKind::Url,
            "bot_command" => EntityKind::BotCommand,
            _ => EntityKind::Other,
        };
        MessageEntity {
            kind,
            offset: self.offset,
            length: self.length,
        }
    }
}

/// `forward_origin` object; every variant's fields are optional here.
#[derive(Debug, Clone, Deserialize)]
pub struct WireForwardOrigin {
    #[serde(rename = "type")]
    pub kind: String,
    pub sender_user: Option<WireUser>,
    pub sender_user_name: Option<String>,
    pub sender_chat: Option<WireChat>,
    pub chat: Option<WireChat>,
    pub message_id: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireFile {
    pub file_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub message_id: i64,
    pub date: Option<i64>,
    pub chat: WireChat,
    pub from: Option<WireUser>,
    pub text: Option<String>,
    pub caption: Option<String>,
    #[serde(default)]
    pub entities: Vec<WireEntity>,
    #[serde(default)]
    pub caption_entities: Vec<WireEntity>,
    pub forward_origin: Option<WireForwardOrigin>,
    pub forward_from: Option<WireUser>,
    pub forward_from_chat: Option<WireChat>,
    pub forward_from_message_id: Option<i64>,
    pub forward_sender_name: Option<String>,
    pub reply_to_message: Option<Box<WireMessage>>,
    #[serde(default)]
    pub photo: Vec<WireFile>,
    pub video: Option<WireFile>,
    #[serde(default)]
    pub new_chat_members: Vec<WireUser>,
}

impl WireMessage {
    fn forward(&self) -> Option<ForwardOrigin> {
        if let Some(origin) = &self.forward_origin {
            return Some(match origin.kind.as_str() {
                "user" => ForwardOrigin::User(
                    origin
                        .sender_user
                        .as_ref()
                        .map(|u| u.to_core())
                        .unwrap_or_default(),
                ),
                "hidden_user" => ForwardOrigin::HiddenUser {
                    name: origin.sender_user_name.clone().unwrap_or_default(),
                },
                _ => {
                    let chat = origin.chat.as_ref().or(origin.sender_chat.as_ref());
                    ForwardOrigin::Chat {
                        title: chat.and_then(|c| c.title.clone()),
                        username: chat.and_then(|c| c.username.clone()),
                        is_channel: origin.kind == "channel",
                        message_id: origin.message_id,
                    }
                }
            });
        }

        if let Some(chat) = &self.forward_from_chat {
            return Some(ForwardOrigin::Chat {
                title: chat.title.clone(),
                username: chat.username.clone(),
                is_channel: chat.kind == "channel",
                message_id: self.forward_from_message_id,
            });
        }
        if let Some(user) = &self.forward_from {
            return Some(ForwardOrigin::User(user.to_core()));
        }
        self.forward_sender_name
            .as_ref()
            .map(|name| ForwardOrigin::HiddenUser { name: name.clone() })
    }

    fn media(&self) -> Option<Media> {
        if let Some(video) = &self.video {
            return Some(Media::Video {
                file_id: video.file_id.clone(),
            });
        }
        // Photo sizes are sent smallest first.
        self.photo.last().map(|p| Media::Photo {
            file_id: p.file_id.clone(),
        })
    }
}

impl ToCoreMessage for WireMessage {
    fn to_core(&self) -> Message {
        let entities = if self.text.is_some() {
            &self.entities
        } else {
            &self.caption_entities
        };
        let created_at = self
            .date
            .and_then(|d| DateTime::<Utc>::from_timestamp(d, 0))
            .unwrap_or_else(Utc::now);

        Message {
            id: self.message_id,
            user: self.from.as_ref().map(|u| u.to_core()).unwrap_or_default(),
            chat: self.chat.to_core(),
            text: self.text.clone(),
            caption: self.caption.clone(),
            entities: entities.iter().map(WireEntity::to_core).collect(),
            forward: self.forward(),
            reply_to: self.reply_to_message.as_ref().map(|r| ReplyContext {
                message_id: r.message_id,
                from_id: r.from.as_ref().map(|u| u.id),
                from_is_bot: r.from.as_ref().map(|u| u.is_bot).unwrap_or(false),
                text: r.text.clone().or_else(|| r.caption.clone()),
            }),
            media: self.media(),
            new_chat_members: self.new_chat_members.iter().map(|u| u.to_core()).collect(),
            created_at,
        }
    }
}
