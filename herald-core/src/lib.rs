//! # herald-core
//!
//! Core types and traits for the herald bot: [`Bot`], [`Handler`], message, chat and user types,
//! bot content tags, webhook update decoding, MarkdownV2 helpers and tracing initialization.
//! Transport-agnostic; used by dispatch, scheduler, herald-telegram and herald-bot.

pub mod bot;
pub mod content_type;
pub mod error;
pub mod logger;
pub mod markdown;
pub mod types;
pub mod update;

pub use bot::{Bot, ChatAction, MediaSource, OutgoingContent, TextFormat};
pub use content_type::BotContentType;
pub use error::{DbotError, Result};
pub use logger::init_tracing;
pub use types::{
    BotIdentity, Chat, ChatKind, EntityKind, ForwardOrigin, Handler, HandlerResponse, Media, Message,
    MessageEntity, ReplyContext, ToCoreMessage, ToCoreUser, User,
};
pub use update::{Update, UpdateKind, WireMessage};
